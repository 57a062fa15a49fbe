pub mod coordinates;
pub mod fix;
pub mod flight;
pub mod league;

pub use coordinates::Coordinates;
pub use fix::Fix;
pub use flight::{Flight, Turnpoint};
pub use league::{FlightType, League, LeagueRegistry};
