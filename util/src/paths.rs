use crate::config;
use std::{
    fs, io,
    path::{Path, PathBuf},
};

/// Create a directory (and all parents) if it doesn't exist, and return the path.
pub fn ensure_dir<P: AsRef<Path>>(path: P) -> io::Result<PathBuf> {
    let p = path.as_ref();
    fs::create_dir_all(p)?;
    Ok(p.to_path_buf())
}

/// Ensure the parent directory of a *file path* exists (no-op if none).
pub fn ensure_parent_dir<P: AsRef<Path>>(file_path: P) -> io::Result<()> {
    if let Some(parent) = file_path.as_ref().parent() {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// Global storage root (absolute), from `config::storage_root()`.
/// If relative in env, resolve against current_dir().
pub fn storage_root() -> PathBuf {
    let root = config::storage_root();
    let p = PathBuf::from(root);
    if p.is_absolute() {
        p
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(p)
    }
}

/// A single exam folder: {STORAGE_ROOT}/exam_{exam_id}
pub fn exam_dir(exam_id: i64) -> PathBuf {
    storage_root().join(format!("exam_{exam_id}"))
}

/// Exam materials (question papers, solution scripts, marking schemes):
/// {STORAGE_ROOT}/exam_{exam_id}/materials
pub fn materials_dir(exam_id: i64) -> PathBuf {
    exam_dir(exam_id).join("materials")
}

/// Path for one stored material file (does not create).
/// Example: material_path(3, "b1f2", "paper.pdf") → .../exam_3/materials/b1f2_paper.pdf
pub fn material_path(exam_id: i64, file_id: &str, filename: &str) -> PathBuf {
    materials_dir(exam_id).join(format!("{file_id}_{filename}"))
}

/// A student's answer-script folder:
/// {STORAGE_ROOT}/exam_{exam_id}/scripts/student_{student_id}
pub fn answer_script_dir(exam_id: i64, student_id: i64) -> PathBuf {
    exam_dir(exam_id).join("scripts").join(format!("student_{student_id}"))
}

/// Path for one stored answer-script file (does not create).
pub fn answer_script_path(exam_id: i64, student_id: i64, file_id: &str, filename: &str) -> PathBuf {
    answer_script_dir(exam_id, student_id).join(format!("{file_id}_{filename}"))
}

// Directory helpers for annotated region images.

/// Cropped answer regions for one response:
/// {STORAGE_ROOT}/exam_{exam_id}/regions/student_{student_id}/question_{question_id}
pub fn answer_region_dir(exam_id: i64, student_id: i64, question_id: i64) -> PathBuf {
    exam_dir(exam_id)
        .join("regions")
        .join(format!("student_{student_id}"))
        .join(format!("question_{question_id}"))
}

/// Cropped marking-scheme regions for one question:
/// {STORAGE_ROOT}/exam_{exam_id}/regions/marking/question_{question_id}
pub fn marking_region_dir(exam_id: i64, question_id: i64) -> PathBuf {
    exam_dir(exam_id)
        .join("regions")
        .join("marking")
        .join(format!("question_{question_id}"))
}
