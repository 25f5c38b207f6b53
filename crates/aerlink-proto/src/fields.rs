//! Device firmware attribute codes.

/// Power status, `"ON"` / `"OFF"`.
pub const POWER: &str = "D03-02";

/// Fan mode, `"Auto General"` / `"Sleep"` / `"Turbo"`.
pub const MODE: &str = "D03-12";

/// PM2.5 particulate reading, integer.
pub const PM2_5: &str = "D03-33";

/// Device name, plaintext info document.
pub const NAME: &str = "D01-03";

/// Device model, plaintext info document.
pub const MODEL: &str = "D01-05";
