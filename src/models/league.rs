use serde::Serialize;

/// Scoring rules for one flight shape within a league.
///
/// Flight types are plain configuration records; the optimizer dispatches
/// on `turnpoints`, `circuit` and `min_leg_fraction`, never on the name.
#[derive(Debug, Clone, Serialize)]
pub struct FlightType {
    pub name: &'static str,
    pub description: &'static str,
    /// Interior turnpoints required, excluding start and finish.
    pub turnpoints: usize,
    /// Whether the route must close back near its starting point.
    pub circuit: bool,
    pub multiplier: f64,
    /// For leg-ratio-constrained circuits: every leg must be at least
    /// this fraction of the total (0.28 for FAI triangles, 0.15 for
    /// quadrilaterals).
    pub min_leg_fraction: Option<f64>,
}

impl FlightType {
    /// Fixes a track must contain for this type to be scorable:
    /// start + interior turnpoints + finish.
    pub fn required_fixes(&self) -> usize {
        self.turnpoints + 2
    }
}

fn open(name: &'static str, description: &'static str, turnpoints: usize) -> FlightType {
    FlightType {
        name,
        description,
        turnpoints,
        circuit: false,
        multiplier: 1.0,
        min_leg_fraction: None,
    }
}

fn circuit(
    name: &'static str,
    description: &'static str,
    turnpoints: usize,
    multiplier: f64,
    min_leg_fraction: Option<f64>,
) -> FlightType {
    FlightType {
        name,
        description,
        turnpoints,
        circuit: true,
        multiplier,
        min_leg_fraction,
    }
}

/// A named competition ruleset: qualifying threshold, turnpoint naming
/// and the flight types it scores.
#[derive(Debug, Clone, Serialize)]
pub struct League {
    pub name: &'static str,
    pub description: Option<&'static str>,
    pub minimum_distance_km: f64,
    start_name: &'static str,
    interior_prefix: &'static str,
    finish_name: &'static str,
    pub flight_types: Vec<FlightType>,
}

impl League {
    /// Display name for the turnpoint at `index` in a tuple of `length`.
    pub fn turnpoint_name(&self, index: usize, length: usize) -> String {
        if index == 0 {
            self.start_name.to_string()
        } else if index + 1 == length {
            self.finish_name.to_string()
        } else {
            format!("{}{}", self.interior_prefix, index)
        }
    }

    pub fn flight_type(&self, name: &str) -> Option<&FlightType> {
        self.flight_types.iter().find(|t| t.name == name)
    }
}

/// Read-only catalog of leagues, built once at startup and injected into
/// callers.
#[derive(Debug, Clone)]
pub struct LeagueRegistry {
    leagues: Vec<League>,
}

impl LeagueRegistry {
    /// The compiled-in league catalog.
    pub fn builtin() -> Self {
        let open_league = League {
            name: "Open",
            description: None,
            minimum_distance_km: 0.0,
            start_name: "Start",
            interior_prefix: "TP",
            finish_name: "Finish",
            flight_types: vec![FlightType {
                name: "Open0",
                description: "Open distance",
                turnpoints: 0,
                circuit: false,
                multiplier: 0.0,
                min_leg_fraction: None,
            }],
        };

        let frcfd = League {
            name: "FRCFD",
            description: Some("Coupe F\u{e9}d\u{e9}rale de Distance (France)"),
            minimum_distance_km: 15.0,
            start_name: "BD",
            interior_prefix: "B",
            finish_name: "BA",
            flight_types: vec![
                open("Open0", "Distance libre", 0),
                open("Open1", "Distance libre avec un point de contournement", 1),
                open("Open2", "Distance libre avec deux points de contournement", 2),
                circuit("Circuit2", "Parcours en aller-retour", 2, 1.2, None),
                circuit("Circuit3", "Triangle plat", 3, 1.2, None),
                circuit("Circuit3FAI", "Triangle FAI", 3, 1.4, Some(0.28)),
                circuit("Circuit4", "Quadrilat\u{e8}re", 4, 1.2, Some(0.15)),
            ],
        };

        let ukxcl = League {
            name: "UKXCL",
            description: Some("Cross Country League (UK)"),
            minimum_distance_km: 15.0,
            start_name: "Start",
            interior_prefix: "TP",
            finish_name: "Finish",
            flight_types: vec![
                open("Open0", "Open distance", 0),
                open("Open1", "Open distance via a turnpoint", 1),
                open("Open2", "Open distance via two turnpoints", 2),
                open("Open3", "Open distance via three turnpoints", 3),
                circuit("Circuit2", "Out and return", 2, 2.0, None),
                circuit("Circuit3", "Flat triangle", 3, 2.0, None),
                circuit("Circuit3FAI", "FAI triangle", 3, 3.0, Some(0.28)),
            ],
        };

        LeagueRegistry {
            leagues: vec![open_league, frcfd, ukxcl],
        }
    }

    pub fn get(&self, name: &str) -> Option<&League> {
        self.leagues.iter().find(|l| l.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &League> {
        self.leagues.iter()
    }
}
