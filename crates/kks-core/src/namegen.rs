//! Names for sessions created without one, e.g. `quiet-quill`.

use rand::RngExt;

const ADJECTIVES: &[&str] = &[
    "amber", "ashen", "bold", "brisk", "calm", "cobalt", "crisp", "dapper", "deft", "dusky",
    "eager", "early", "fleet", "frank", "gentle", "glossy", "hardy", "hazel", "humble", "inky",
    "jolly", "keen", "lucid", "mellow", "misty", "nimble", "noble", "olive", "plain", "polished",
    "quick", "quiet", "rapid", "rustic", "sable", "serene", "silent", "slate", "sober", "steady",
    "sturdy", "subtle", "swift", "tidy", "umber", "vivid", "wary", "witty", "young", "zesty",
];

const NOUNS: &[&str] = &[
    "anchor", "atlas", "bookmark", "brush", "caret", "chisel", "cipher", "column", "compass",
    "cursor", "draft", "easel", "folio", "glyph", "gutter", "index", "inkwell", "kernel",
    "lantern", "ledger", "lens", "margin", "marker", "meridian", "notch", "outline", "page",
    "palette", "parchment", "pencil", "pilcrow", "press", "prism", "quill", "quire", "register",
    "ribbon", "scroll", "sextant", "sketch", "spindle", "stencil", "stylus", "tablet", "thimble",
    "tracer", "vellum", "verse", "widget", "writ",
];

/// Random `adjective-noun` name
pub fn generate_name() -> String {
    let mut rng = rand::rng();
    let adjective = ADJECTIVES[rng.random_range(0..ADJECTIVES.len())];
    let noun = NOUNS[rng.random_range(0..NOUNS.len())];
    format!("{}-{}", adjective, noun)
}

/// Random name not already in `existing`. After a handful of collisions a
/// timestamp suffix guarantees uniqueness.
pub fn generate_unique_name(existing: &[String]) -> String {
    let taken = |name: &String| existing.contains(name);

    if let Some(name) = (0..16).map(|_| generate_name()).find(|n| !taken(n)) {
        return name;
    }

    let mut name = format!("{}-{}", generate_name(), chrono::Utc::now().timestamp());
    while taken(&name) {
        name = format!("{}-{}", generate_name(), chrono::Utc::now().timestamp_millis());
    }
    name
}
