/// Sport identifiers offered on the registration form.
/// These are the exact values the form posts; indoor sports are posted as
/// "<sport>-<variant>" and expanded by the catalog.

// Outdoor team sports
pub const OUTDOOR_SPORTS: &[&str] = &["cricket", "football", "volleyball", "kho-kho"];

// Indoor sports and the variants each one is played in
pub const INDOOR_SPORTS: &[(&str, &[&str])] = &[
    ("badminton", &["single", "doubles", "mixed"]),
    ("tabletennis", &["single", "doubles", "mixed"]),
    ("carrom", &["singles", "doubles"]),
    ("chess", &["singles"]),
];

pub const ATHLETICS: &[&str] = &["100m", "200m", "650m", "1200m", "relay"];

pub const FUN_ACTIVITIES: &[&str] = &[
    "dodgeball",
    "tugofwar",
    "lemonspoon",
    "sackrace",
    "threelegrace",
    "facepainting",
    "calligraphy",
    "creativewriting",
    "cooking",
    "bestoutofwaste",
    "mehandi",
    "poetry",
    "graphicdesign",
];

// Selecting any of these obliges the registrant to name a partner
pub const PARTNER_SPORTS: &[&str] = &[
    "badminton-doubles",
    "badminton-mixed",
    "tabletennis-doubles",
    "tabletennis-mixed",
    "carrom-doubles",
];

// Field limits
pub const MAX_NAME_LEN: usize = 100;
pub const MAX_COURSE_LEN: usize = 100;
pub const MAX_PARTNER_NAME_LEN: usize = 100;
pub const MAX_NOTES_LEN: usize = 1000;
pub const MIN_YEAR: i64 = 1;
pub const MAX_YEAR: i64 = 4;
