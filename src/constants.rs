/// Prompts the auto-player picks from when the board needs a fresh concept
pub const DEFAULT_CREATE_PROMPTS: &[&str] = &["Universe", "Life", "Time", "Space", "Energy"];

/// Maximum number of auto-play actions in flight at once
pub const DEFAULT_MAX_CONCURRENT: usize = 3;

/// Delay between auto-play ticks
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 500;

/// Card labels shown while a generation call is outstanding
pub const GENERATING_LABEL: &str = "Generating...";
pub const MIXING_LABEL: &str = "Mixing...";
pub const SPLITTING_LABEL: &str = "Splitting...";

/// Detail pane fallbacks for a card that has no concept yet
pub const PENDING_EMOJI: &str = "⏳";
pub const PENDING_DESCRIPTION: &str = "Please wait while the concept is being generated.";

/// Usage tips shown when nothing is selected
pub const TIPS: &[&str] = &[
    "Click to view details",
    "Drag and drop to mix",
    "Double click to split",
    "Ctrl/Cmd click to multi-select",
];

/// Alphabet and length for card identifiers
pub const CARD_ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";
pub const CARD_ID_LENGTH: usize = 8;

/// Config files larger than this are rejected
pub const MAX_CONFIG_BYTES: u64 = 1_048_576;
