//! Reference validation: the single-pass repair algorithm over a case's file
//! references.
//!
//! The pass walks the references in a fixed order (main document first, then
//! attachments in list order) and re-checks existence on disk every time.
//! When a correction from the user is in play, exactly one reference (the
//! first missing one encountered in the pass) receives the user's literal
//! replacement path. Every later missing attachment can only be repaired by
//! the directory-join heuristic: the directory of the replacement joined with
//! the missing file's own name, accepted only when that candidate actually
//! exists. The pass halts at the first miss it cannot repair and reports that
//! reference's original path.

use std::path::{Path, PathBuf};

use crate::case::Case;
use crate::util::display_name;

/// One round's worth of user correction. `original_path` is the path that was
/// reported missing; `fixed_path` is the user-supplied replacement.
#[derive(Debug, Clone)]
pub struct CorrectionDirective {
    pub original_path: PathBuf,
    pub fixed_path: PathBuf,
    /// When set, the replacement's directory is also tried for every other
    /// missing attachment in the same pass.
    pub apply_for_all: bool,
}

/// The reference a validation pass halted on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingReference {
    /// Display name of the reference (main document name or attachment title).
    pub name: String,
    pub path: PathBuf,
}

/// Result of one validation pass: the (possibly repaired) case, and the first
/// unresolved missing reference if the pass halted.
#[derive(Debug)]
pub struct Validation {
    pub case: Case,
    pub missing: Option<MissingReference>,
}

impl Validation {
    pub fn is_valid(&self) -> bool {
        self.missing.is_none()
    }
}

fn exists(path: &Path) -> bool {
    path.exists()
}

/// Candidate path for the apply-for-all heuristic: the replacement's
/// directory joined with the missing file's own name.
fn join_candidate(fixed_path: &Path, missing: &Path) -> Option<PathBuf> {
    let dir = fixed_path.parent()?;
    let name = missing.file_name()?;
    Some(dir.join(name))
}

/// Run one validation pass over `case`, applying `correction` if supplied.
///
/// Existence is checked live on every call; results are never cached. The
/// pass is order-dependent: main first, then attachments in list order, and
/// only the first missing reference of the pass receives `fixed_path`
/// directly, regardless of `apply_for_all`.
pub fn validate_case(mut case: Case, correction: Option<&CorrectionDirective>) -> Validation {
    // Tracks whether the one direct substitution this pass allows has been
    // spent on an earlier reference.
    let mut substitution_spent = false;

    if let Some(main) = case.main.as_mut()
        && !exists(&main.path)
    {
        match correction {
            None => {
                // No correction this round: report immediately, nothing else
                // is checked.
                return Validation {
                    missing: Some(MissingReference {
                        name: main.name.clone(),
                        path: main.path.clone(),
                    }),
                    case,
                };
            }
            Some(c) => {
                main.path = c.fixed_path.clone();
                main.name = display_name(&main.path);
                substitution_spent = true;
            }
        }
    }

    for attachment in case.attachments.iter_mut() {
        if exists(&attachment.path) {
            continue;
        }
        let halt = MissingReference {
            name: attachment.name.clone(),
            path: attachment.path.clone(),
        };
        match correction {
            None => {
                return Validation {
                    missing: Some(halt),
                    case,
                };
            }
            Some(c) if !substitution_spent => {
                // First missing reference of the whole pass: direct
                // substitution, title kept.
                attachment.path = c.fixed_path.clone();
                substitution_spent = true;
            }
            Some(c) if c.apply_for_all => {
                match join_candidate(&c.fixed_path, &attachment.path) {
                    Some(candidate) if exists(&candidate) => {
                        attachment.path = candidate;
                    }
                    _ => {
                        return Validation {
                            missing: Some(halt),
                            case,
                        };
                    }
                }
            }
            Some(_) => {
                return Validation {
                    missing: Some(halt),
                    case,
                };
            }
        }
    }

    Validation {
        case,
        missing: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::case::DocumentReference;
    use std::fs;
    use tempfile::tempdir;

    fn touch(path: &Path) {
        fs::write(path, b"x").unwrap();
    }

    fn case_with(main: Option<&Path>, attachments: &[(&str, &Path)]) -> Case {
        let mut case = Case::new("c1", "Test Case");
        case.main = main.map(DocumentReference::from_path);
        case.attachments = attachments
            .iter()
            .map(|(name, path)| DocumentReference::named(*name, *path))
            .collect();
        case
    }

    #[test]
    fn all_existing_paths_validate_on_first_call() {
        let dir = tempdir().unwrap();
        let main = dir.path().join("brief.docx");
        let ex1 = dir.path().join("ex1.pdf");
        touch(&main);
        touch(&ex1);

        let case = case_with(Some(&main), &[("Exhibit 1", &ex1)]);
        let result = validate_case(case, None);
        assert!(result.is_valid());
    }

    #[test]
    fn missing_main_is_reported_before_attachments_are_checked() {
        let dir = tempdir().unwrap();
        let main = dir.path().join("brief.docx"); // never created
        let case = case_with(Some(&main), &[("Exhibit 1", Path::new("/nowhere/ex1.pdf"))]);

        let result = validate_case(case, None);
        let missing = result.missing.unwrap();
        assert_eq!(missing.path, main);
        assert_eq!(missing.name, "brief");
    }

    #[test]
    fn correction_replaces_main_regardless_of_apply_for_all() {
        let dir = tempdir().unwrap();
        let old_main = dir.path().join("a/brief.docx"); // missing
        let new_main = dir.path().join("brief.docx");
        let ex1 = dir.path().join("ex1.pdf");
        touch(&new_main);
        touch(&ex1);

        let case = case_with(Some(&old_main), &[("Exhibit 1", &ex1)]);
        let correction = CorrectionDirective {
            original_path: old_main,
            fixed_path: new_main.clone(),
            apply_for_all: false,
        };
        let result = validate_case(case, Some(&correction));
        assert!(result.is_valid());
        let main = result.case.main.unwrap();
        assert_eq!(main.path, new_main);
        assert_eq!(main.name, "brief");
        // attachment untouched
        assert_eq!(result.case.attachments[0].path, ex1);
    }

    #[test]
    fn only_first_missing_reference_gets_direct_substitution() {
        // Main missing, attachment also missing: the substitution is spent on
        // main, the attachment halts the pass with its original path.
        let dir = tempdir().unwrap();
        let old_main = dir.path().join("a/brief.docx");
        let new_main = dir.path().join("brief.docx");
        touch(&new_main);
        let gone_ex = PathBuf::from("/a/ex1.pdf");

        let case = case_with(Some(&old_main), &[("Exhibit 1", &gone_ex)]);
        let correction = CorrectionDirective {
            original_path: old_main,
            fixed_path: new_main,
            apply_for_all: false,
        };
        let result = validate_case(case, Some(&correction));
        let missing = result.missing.unwrap();
        assert_eq!(missing.path, gone_ex);
        assert_eq!(missing.name, "Exhibit 1");
    }

    #[test]
    fn first_missing_attachment_gets_substitution_and_keeps_title() {
        let dir = tempdir().unwrap();
        let main = dir.path().join("brief.docx");
        let fixed = dir.path().join("ex1-moved.pdf");
        touch(&main);
        touch(&fixed);
        let gone = PathBuf::from("/a/ex1.pdf");

        let case = case_with(Some(&main), &[("Exhibit 1", &gone)]);
        let correction = CorrectionDirective {
            original_path: gone,
            fixed_path: fixed.clone(),
            apply_for_all: false,
        };
        let result = validate_case(case, Some(&correction));
        assert!(result.is_valid());
        let att = &result.case.attachments[0];
        assert_eq!(att.path, fixed);
        assert_eq!(att.name, "Exhibit 1");
    }

    #[test]
    fn second_missing_attachment_without_apply_for_all_halts() {
        let dir = tempdir().unwrap();
        let main = dir.path().join("brief.docx");
        let fixed = dir.path().join("ex1.pdf");
        touch(&main);
        touch(&fixed);
        let gone1 = PathBuf::from("/a/ex1.pdf");
        let gone2 = PathBuf::from("/a/ex2.pdf");

        let case = case_with(Some(&main), &[("Exhibit 1", &gone1), ("Exhibit 2", &gone2)]);
        let correction = CorrectionDirective {
            original_path: gone1,
            fixed_path: fixed,
            apply_for_all: false,
        };
        let result = validate_case(case, Some(&correction));
        assert_eq!(result.missing.unwrap().path, gone2);
    }

    #[test]
    fn apply_for_all_joins_directory_with_original_file_name() {
        // Main corrected to dir/brief.docx; missing attachment /a/ex1.pdf is
        // repaired to dir/ex1.pdf because that file exists.
        let dir = tempdir().unwrap();
        let old_main = PathBuf::from("/a/brief.docx");
        let new_main = dir.path().join("brief.docx");
        let relocated_ex = dir.path().join("ex1.pdf");
        touch(&new_main);
        touch(&relocated_ex);

        let case = case_with(
            Some(&old_main),
            &[("Exhibit 1", Path::new("/a/ex1.pdf"))],
        );
        let correction = CorrectionDirective {
            original_path: old_main,
            fixed_path: new_main,
            apply_for_all: true,
        };
        let result = validate_case(case, Some(&correction));
        assert!(result.is_valid());
        assert_eq!(result.case.attachments[0].path, relocated_ex);
    }

    #[test]
    fn apply_for_all_halts_when_candidate_does_not_exist() {
        let dir = tempdir().unwrap();
        let old_main = PathBuf::from("/a/brief.docx");
        let new_main = dir.path().join("brief.docx");
        touch(&new_main);
        // dir/ex1.pdf deliberately absent
        let gone = PathBuf::from("/a/ex1.pdf");

        let case = case_with(Some(&old_main), &[("Exhibit 1", &gone)]);
        let correction = CorrectionDirective {
            original_path: old_main,
            fixed_path: new_main,
            apply_for_all: true,
        };
        let result = validate_case(case, Some(&correction));
        assert_eq!(result.missing.unwrap().path, gone);
    }

    #[test]
    fn apply_for_all_keeps_scanning_after_each_repair() {
        let dir = tempdir().unwrap();
        let main = dir.path().join("brief.docx");
        let fixed1 = dir.path().join("ex1.pdf");
        let relocated2 = dir.path().join("ex2.pdf");
        touch(&main);
        touch(&fixed1);
        touch(&relocated2);
        let gone1 = PathBuf::from("/a/ex1.pdf");
        let gone2 = PathBuf::from("/a/ex2.pdf");

        let case = case_with(Some(&main), &[("Exhibit 1", &gone1), ("Exhibit 2", &gone2)]);
        let correction = CorrectionDirective {
            original_path: gone1,
            fixed_path: fixed1.clone(),
            apply_for_all: true,
        };
        let result = validate_case(case, Some(&correction));
        assert!(result.is_valid());
        assert_eq!(result.case.attachments[0].path, fixed1);
        assert_eq!(result.case.attachments[1].path, relocated2);
    }

    #[test]
    fn case_without_main_validates_attachments_only() {
        let dir = tempdir().unwrap();
        let ex1 = dir.path().join("ex1.pdf");
        touch(&ex1);
        let case = case_with(None, &[("Exhibit 1", &ex1)]);
        assert!(validate_case(case, None).is_valid());
    }
}
