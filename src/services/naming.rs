//! Stored-name policy: `<YYYYMMDDTHHMMSS>-<sanitized filename>`.
//!
//! The UTC timestamp prefix is zero padded, so names sort lexically in upload
//! order. Two uploads of the same file within one second share a name and the
//! later one overwrites the earlier.

use chrono::{DateTime, Utc};
use unicode_normalization::UnicodeNormalization;

const TIMESTAMP_FORMAT: &str = "%Y%m%dT%H%M%S";

/// Reduce a client filename to `[A-Za-z0-9._-]`.
///
/// The name is NFKD-decomposed first so accented letters keep their base
/// letter (`é` becomes `e`), then anything non-ASCII is dropped. Path
/// separators and whitespace become word breaks joined by `_`, any other
/// character outside the safe set is dropped, and leading or trailing `.` and
/// `_` are trimmed. The result may be empty. Sanitizing twice is a no-op.
pub fn sanitize_filename(raw: &str) -> String {
    let spaced: String = raw
        .nfkd()
        .filter(char::is_ascii)
        .map(|c| if matches!(c, '/' | '\\') { ' ' } else { c })
        .collect();
    let joined = spaced.split_whitespace().collect::<Vec<_>>().join("_");

    joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(*c, '.' | '_' | '-'))
        .collect::<String>()
        .trim_matches(|c: char| c == '.' || c == '_')
        .to_string()
}

pub fn timestamp_prefix(now: DateTime<Utc>) -> String {
    now.format(TIMESTAMP_FORMAT).to_string()
}

/// Join the timestamp and an already sanitized filename.
pub fn blob_name(now: DateTime<Utc>, sanitized: &str) -> String {
    format!("{}-{}", timestamp_prefix(now), sanitized)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn spaces_become_underscores_and_case_is_kept() {
        assert_eq!(sanitize_filename("cat pic.JPG"), "cat_pic.JPG");
        assert_eq!(sanitize_filename("  my   holiday\tphoto.png "), "my_holiday_photo.png");
    }

    #[test]
    fn path_components_are_flattened() {
        assert_eq!(sanitize_filename("../../etc/passwd"), "etc_passwd");
        assert_eq!(sanitize_filename("C:\\Users\\me\\cat.png"), "C_Users_me_cat.png");
        assert_eq!(sanitize_filename("/tmp/.hidden.png"), "tmp_.hidden.png");
    }

    #[test]
    fn unsafe_characters_are_dropped() {
        assert_eq!(sanitize_filename("we?ird*na<me>.gif"), "weirdname.gif");
        assert_eq!(sanitize_filename("???"), "");
        assert_eq!(sanitize_filename("..."), "");
    }

    #[test]
    fn accents_fold_to_their_base_letter() {
        assert_eq!(sanitize_filename("café.png"), "cafe.png");
        assert_eq!(sanitize_filename("café naïve.png"), "cafe_naive.png");
        assert_eq!(sanitize_filename("ﬁle①.jpg"), "file1.jpg");
        assert_eq!(sanitize_filename("日本.png"), "png");
    }

    #[test]
    fn sanitizing_is_idempotent() {
        for raw in [
            "cat pic.JPG",
            "../../etc/passwd",
            "_.weird name_.png._",
            "a\\b/c d.e-f_g",
            "ünïcödé ✓.webp",
        ] {
            let once = sanitize_filename(raw);
            assert_eq!(sanitize_filename(&once), once, "raw = {raw:?}");
        }
    }

    #[test]
    fn blob_name_is_timestamp_prefixed() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(
            blob_name(now, &sanitize_filename("cat pic.JPG")),
            "20240101T000000-cat_pic.JPG"
        );
    }

    #[test]
    fn later_timestamps_sort_after_earlier_ones() {
        let earlier = Utc.with_ymd_and_hms(2024, 9, 30, 23, 59, 59).unwrap();
        let later = Utc.with_ymd_and_hms(2024, 10, 1, 0, 0, 0).unwrap();
        assert!(blob_name(later, "a.png") > blob_name(earlier, "z.png"));
    }
}
