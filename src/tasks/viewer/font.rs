use ab_glyph::{FontArc, FontVec};
use fontdb::{Database, Family, Query};
use tracing::{debug, warn};

const FALLBACK_FAMILY: &str = "DejaVu Sans";

/// Load the caption font from the system font database. Falls back to a
/// common sans face and then to whatever sans-serif the system maps.
pub fn resolve_caption_font(requested: Option<&str>) -> Option<FontArc> {
    let mut db = Database::new();
    db.load_system_fonts();

    let requested = requested.map(str::trim).filter(|name| !name.is_empty());
    if let Some(name) = requested {
        if let Some(font) = load_family(&db, Family::Name(name)) {
            return Some(font);
        }
        warn!(font = %name, "caption font not found; using fallback");
    }

    load_family(&db, Family::Name(FALLBACK_FAMILY))
        .or_else(|| load_family(&db, Family::SansSerif))
        .or_else(|| {
            warn!(faces = db.len(), "no usable caption font; captions disabled");
            None
        })
}

fn load_family(db: &Database, family: Family<'_>) -> Option<FontArc> {
    let query = Query {
        families: &[family],
        ..Default::default()
    };
    let id = db.query(&query)?;
    let font = db
        .with_face_data(id, |data, index| {
            FontVec::try_from_vec_and_index(data.to_vec(), index)
        })?
        .ok()?;
    debug!(?id, "caption font resolved");
    Some(FontArc::new(font))
}
