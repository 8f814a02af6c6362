//! Input file checks.

use std::path::Path;

/// Returns the first path that does not point to an existing regular file.
pub fn first_missing_file<'a, P>(paths: &'a [P]) -> Option<&'a Path>
where
    P: AsRef<Path>,
{
    paths.iter().map(P::as_ref).find(|path| !path.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::test_output_path;

    #[test]
    fn test_first_missing_file() {
        let present = test_output_path("file_utils_present.txt");
        std::fs::write(&present, b"x").unwrap();
        let absent = test_output_path("file_utils_absent.txt");
        let _ = std::fs::remove_file(&absent);

        assert_eq!(first_missing_file(&[&present]), None);
        assert_eq!(
            first_missing_file(&[&present, &absent]),
            Some(absent.as_path())
        );
    }

    #[test]
    fn test_directory_is_not_a_file() {
        let dir = test_output_path("");
        assert_eq!(first_missing_file(&[&dir]), Some(dir.as_path()));
    }
}
