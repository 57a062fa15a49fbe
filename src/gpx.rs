//! GPX 1.1 rendering of scored flights.
//!
//! One `<rte>` per flight, with the scoring summary in `<extensions>`
//! and one `<rtept>` per turnpoint, for downstream map tooling.

use crate::error::Result;
use crate::models::{Flight, Turnpoint};
use std::io::Write;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

pub fn write_gpx<W: Write>(writer: &mut W, flights: &[Flight]) -> Result<()> {
    writeln!(writer, "<?xml version=\"1.0\"?>")?;
    writeln!(
        writer,
        "<gpx version=\"1.1\" creator=\"xcscore\">"
    )?;
    for flight in flights {
        write_route(writer, flight)?;
    }
    writeln!(writer, "</gpx>")?;
    Ok(())
}

fn write_route<W: Write>(writer: &mut W, flight: &Flight) -> Result<()> {
    writeln!(writer, "\t<rte>")?;
    writeln!(writer, "\t\t<name>{}</name>", escape(flight.description))?;
    writeln!(writer, "\t\t<extensions>")?;
    writeln!(
        writer,
        "\t\t\t<league>{}</league>",
        escape(flight.league)
    )?;
    writeln!(
        writer,
        "\t\t\t<distance>{:.3}</distance>",
        flight.distance_km
    )?;
    writeln!(
        writer,
        "\t\t\t<multiplier>{:.1}</multiplier>",
        flight.multiplier
    )?;
    writeln!(writer, "\t\t\t<score>{:.2}</score>", flight.score)?;
    if flight.circuit {
        writeln!(writer, "\t\t\t<circuit/>")?;
    }
    writeln!(writer, "\t\t</extensions>")?;
    for turnpoint in &flight.turnpoints {
        write_route_point(writer, turnpoint)?;
    }
    writeln!(writer, "\t</rte>")?;
    Ok(())
}

fn write_route_point<W: Write>(writer: &mut W, turnpoint: &Turnpoint) -> Result<()> {
    writeln!(
        writer,
        "\t\t<rtept lat=\"{:.8}\" lon=\"{:.8}\">",
        turnpoint.coordinates.lat, turnpoint.coordinates.lng
    )?;
    writeln!(writer, "\t\t\t<ele>{:.0}</ele>", turnpoint.coordinates.ele)?;
    if let Some(time) = rfc3339(turnpoint.time) {
        writeln!(writer, "\t\t\t<time>{}</time>", time)?;
    }
    writeln!(writer, "\t\t\t<name>{}</name>", escape(&turnpoint.name))?;
    writeln!(writer, "\t\t</rtept>")?;
    Ok(())
}

fn rfc3339(epoch: i64) -> Option<String> {
    OffsetDateTime::from_unix_timestamp(epoch)
        .ok()
        .and_then(|dt| dt.format(&Rfc3339).ok())
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
