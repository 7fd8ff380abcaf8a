//! Coarse progress-phase titles.
//!
//! Purely presentational; state transitions never depend on these.

/// Map a progress percentage to a phase title for display.
pub fn progress_title(progress: u8) -> &'static str {
    if progress < 30 {
        "Identifying books in the image..."
    } else if progress < 60 {
        "Looking up book details..."
    } else if progress < 90 {
        "Saving recognition results..."
    } else if progress < 100 {
        "Almost done..."
    } else {
        "Done"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bucket_boundaries() {
        assert_eq!(progress_title(0), "Identifying books in the image...");
        assert_eq!(progress_title(29), "Identifying books in the image...");
        assert_eq!(progress_title(30), "Looking up book details...");
        assert_eq!(progress_title(59), "Looking up book details...");
        assert_eq!(progress_title(60), "Saving recognition results...");
        assert_eq!(progress_title(89), "Saving recognition results...");
        assert_eq!(progress_title(90), "Almost done...");
        assert_eq!(progress_title(99), "Almost done...");
        assert_eq!(progress_title(100), "Done");
    }
}
