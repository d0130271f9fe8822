use std::io::Write;
use tempfile::NamedTempFile;

pub const HEADER: &str = "school,sex,age,studytime,failures,absences,G1,G2,G3";

/// Sixty students whose grades run 0..=20; G3 equals G1, so exactly the
/// rows with G1 above 10 pass.
pub fn student_rows() -> Vec<String> {
    (0..60)
        .map(|i| {
            let grade = i % 21;
            format!(
                "{},{},{},{},{},{},{},{},{}",
                if i % 3 == 0 { "MS" } else { "GP" },
                if i % 2 == 0 { "F" } else { "M" },
                15 + i % 4,
                1 + i % 4,
                if grade < 6 { i % 3 } else { 0 },
                (i * 7) % 15,
                grade,
                grade,
                grade
            )
        })
        .collect()
}

pub fn create_test_csv() -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "{}", HEADER).unwrap();
    for row in student_rows() {
        writeln!(file, "{}", row).unwrap();
    }
    file.flush().unwrap();
    file
}
