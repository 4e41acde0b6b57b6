//! Tunable limits for the ZIP offset walker

/// Default backward search window for locating the End of Central
/// Directory Record: a ZIP comment can be at most 65535 bytes, so
/// 512 KiB is generous headroom while still bounding scans on files
/// that are not ZIP archives at all.
pub const DEFAULT_EOCDR_SEARCH_WINDOW: u64 = 512 * 1024;

/// Scan limits and strictness knobs for [`crate::validate_offsets_with_options`]
/// and [`crate::adjust_offsets_with_options`].
///
/// Built with the builder methods below; the plain-named entry points
/// (`validate_offsets`, `adjust_offsets`) use [`ScanOptions::default`].
#[derive(Debug, Clone, Copy)]
pub struct ScanOptions {
    pub(crate) eocdr_search_window: u64,
    pub(crate) strict_comment_length: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        ScanOptions {
            eocdr_search_window: DEFAULT_EOCDR_SEARCH_WINDOW,
            strict_comment_length: false,
        }
    }
}

impl ScanOptions {
    /// Create options with the default 512 KiB search window and
    /// EndFirst (non-strict) EOCDR acceptance.
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the backward scan bound used to locate the EOCDR.
    pub fn eocdr_search_window(mut self, window: u64) -> Self {
        self.eocdr_search_window = window;
        self
    }

    /// When `true`, an EOCDR match is only accepted if its declared
    /// `commentLength` reaches exactly end-of-file, tightening the
    /// EndFirst strategy against signature collisions inside comments.
    pub fn strict_comment_length(mut self, strict: bool) -> Self {
        self.strict_comment_length = strict;
        self
    }
}
