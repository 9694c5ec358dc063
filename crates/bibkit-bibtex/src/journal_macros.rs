//! AASTeX journal abbreviations
//!
//! ADS exports write journals as `\apj`, `\mnras` and so on. With
//! `ParserSettings::expand_journal_macros` the parser replaces a `journal`
//! value consisting of exactly one such command by the full name.

use lazy_static::lazy_static;
use std::collections::HashMap;

const JOURNALS: &[(&str, &str)] = &[
    // Astronomy
    ("aj", "Astronomical Journal"),
    ("apj", "Astrophysical Journal"),
    ("apjl", "Astrophysical Journal, Letters"),
    ("apjlett", "Astrophysical Journal, Letters"),
    ("apjs", "Astrophysical Journal, Supplement"),
    ("apjsupp", "Astrophysical Journal, Supplement"),
    ("mnras", "Monthly Notices of the Royal Astronomical Society"),
    ("aap", "Astronomy and Astrophysics"),
    ("astap", "Astronomy and Astrophysics"),
    ("aaps", "Astronomy and Astrophysics, Supplement"),
    ("aapr", "Astronomy and Astrophysics Reviews"),
    ("araa", "Annual Review of Astronomy and Astrophysics"),
    ("pasp", "Publications of the Astronomical Society of the Pacific"),
    ("pasj", "Publications of the Astronomical Society of Japan"),
    ("pasa", "Publications of the Astronomical Society of Australia"),
    ("baas", "Bulletin of the American Astronomical Society"),
    ("actaa", "Acta Astronomica"),
    ("apss", "Astrophysics and Space Science"),
    ("ssr", "Space Science Reviews"),
    ("icarus", "Icarus"),
    ("psj", "Planetary Science Journal"),
    ("solphys", "Solar Physics"),
    ("jcap", "Journal of Cosmology and Astroparticle Physics"),
    ("na", "New Astronomy"),
    ("nar", "New Astronomy Review"),
    // Physics
    ("prl", "Physical Review Letters"),
    ("pra", "Physical Review A"),
    ("prb", "Physical Review B"),
    ("prc", "Physical Review C"),
    ("prd", "Physical Review D"),
    ("pre", "Physical Review E"),
    ("physrep", "Physics Reports"),
    ("jcp", "Journal of Chemical Physics"),
    ("jqsrt", "Journal of Quantitative Spectroscopy and Radiative Transfer"),
    ("ao", "Applied Optics"),
    ("procspie", "Proceedings of the SPIE"),
    // Earth and planetary
    ("grl", "Geophysical Research Letters"),
    ("jgr", "Journal of Geophysical Research"),
    ("planss", "Planetary and Space Science"),
    ("gca", "Geochimica et Cosmochimica Acta"),
    // General
    ("nat", "Nature"),
    ("sci", "Science"),
];

lazy_static! {
    static ref MACROS: HashMap<&'static str, &'static str> = JOURNALS.iter().copied().collect();
}

/// Full journal name for a value such as `\apj` (case-insensitive)
pub fn expand_journal_macro(value: &str) -> Option<&'static str> {
    let name = value.trim().strip_prefix('\\')?;
    MACROS.get(name.to_lowercase().as_str()).copied()
}

pub fn is_journal_macro(value: &str) -> bool {
    expand_journal_macro(value).is_some()
}
