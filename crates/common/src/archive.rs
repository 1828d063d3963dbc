//! Sample archive packaging for `upload_sample`.
//!
//! The archive is a zip holding three entries named after the sample's SHA1:
//! `<sha1>.meta` (submission metadata), `<sha1>.log` (submission date) and
//! `<sha1>.dat` (the sample bytes). It is assembled in memory, so no scratch
//! files are left behind whichever way the upload ends.

use std::fs;
use std::io::{Cursor, Write};
use std::path::Path;

use chrono::{DateTime, TimeZone};
use error_stack::{Report, ResultExt};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::DdanError;
use crate::hash::sha1_hex;
use crate::identity::ClientIdentity;

/// A packaged sample ready for upload.
#[derive(Debug, Clone)]
pub struct SampleArchive {
    /// Zip bytes.
    pub bytes: Vec<u8>,
    /// SHA1 of the zip bytes.
    pub sha1: String,
    /// SHA1 of the original sample.
    pub sample_sha1: String,
    /// `<YYYYMMDD-HHMMSS>_<archive sha1>.zip`
    pub file_name: String,
}

/// Contents of the `.meta` entry.
pub fn meta_file_contents(
    original_file_name: &str,
    sample_sha1: &str,
    password: &str,
    identity: &ClientIdentity,
) -> String {
    format!(
        "OrigFileName={}\nSHA1={}\nArchivePassword={}\nClientUUID={}\nSourceID={}\n",
        original_file_name,
        sample_sha1,
        password,
        identity.uuid(),
        identity.source_id()
    )
}

/// Contents of the `.log` entry: the URL-encoded submission date.
pub fn log_file_contents<Tz: TimeZone>(now: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let date = now.format("%m/%d/%Y %H:%M:%S").to_string();
    format!("Date={}", urlencoding::encode(&date).replace("%2F", "%2f"))
}

/// Upload name for an archive created at `now`.
pub fn archive_file_name<Tz: TimeZone>(now: &DateTime<Tz>, archive_sha1: &str) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!("{}_{}.zip", now.format("%Y%m%d-%H%M%S"), archive_sha1)
}

/// Package the sample at `path` for upload.
///
/// # Errors
///
/// - [`DdanError::Io`] if the sample cannot be read or has no file name
/// - [`DdanError::Archive`] if the zip cannot be written
pub fn build_sample_archive<Tz: TimeZone>(
    path: &Path,
    password: &str,
    identity: &ClientIdentity,
    now: &DateTime<Tz>,
) -> Result<SampleArchive, Report<DdanError>>
where
    Tz::Offset: std::fmt::Display,
{
    let original_file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| {
            Report::new(DdanError::Io {
                message: format!("{} has no file name", path.display()),
            })
        })?;

    let contents = fs::read(path).change_context(DdanError::Io {
        message: format!("Failed to read sample {}", path.display()),
    })?;
    let sample_sha1 = sha1_hex(&contents);

    let entries = [
        (
            format!("{sample_sha1}.meta"),
            meta_file_contents(&original_file_name, &sample_sha1, password, identity).into_bytes(),
        ),
        (
            format!("{sample_sha1}.log"),
            log_file_contents(now).into_bytes(),
        ),
        (format!("{sample_sha1}.dat"), contents),
    ];

    let bytes = write_zip(&entries)?;
    let sha1 = sha1_hex(&bytes);
    let file_name = archive_file_name(now, &sha1);

    log::info!(
        "Packaged {} ({}) as {} ({} bytes)",
        original_file_name,
        sample_sha1,
        file_name,
        bytes.len()
    );

    Ok(SampleArchive {
        bytes,
        sha1,
        sample_sha1,
        file_name,
    })
}

fn write_zip(entries: &[(String, Vec<u8>)]) -> Result<Vec<u8>, Report<DdanError>> {
    let archive_error = || DdanError::Archive {
        message: "Failed to write sample archive".into(),
    };

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for (name, data) in entries {
        writer
            .start_file(name.as_str(), options)
            .change_context_lazy(archive_error)
            .attach(format!("Entry: {name}"))?;
        writer
            .write_all(data)
            .change_context_lazy(archive_error)
            .attach(format!("Entry: {name}"))?;
    }

    let cursor = writer.finish().change_context_lazy(archive_error)?;
    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    use chrono::{Local, Utc};
    use zip::ZipArchive;

    use crate::test_support::tests::create_test_settings;

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 16, 12, 5, 9)
            .single()
            .expect("valid timestamp")
    }

    fn identity() -> ClientIdentity {
        ClientIdentity::with_uuid(&create_test_settings(), "u1")
    }

    fn read_entries(bytes: &[u8]) -> Vec<(String, Vec<u8>)> {
        let mut archive = ZipArchive::new(Cursor::new(bytes)).expect("valid zip");
        (0..archive.len())
            .map(|i| {
                let mut entry = archive.by_index(i).expect("entry");
                let mut data = Vec::new();
                entry.read_to_end(&mut data).expect("entry data");
                (entry.name().to_string(), data)
            })
            .collect()
    }

    #[test]
    fn test_log_file_contents() {
        assert_eq!(
            log_file_contents(&fixed_time()),
            "Date=10%2f16%2f2026%2012%3A05%3A09"
        );
    }

    #[test]
    fn test_archive_file_name() {
        assert_eq!(
            archive_file_name(&fixed_time(), "abc123"),
            "20261016-120509_abc123.zip"
        );
    }

    #[test]
    fn test_meta_file_contents() {
        let meta = meta_file_contents("invoice.pdf", "deadbeef", "1234", &identity());
        assert_eq!(
            meta,
            "OrigFileName=invoice.pdf\nSHA1=deadbeef\nArchivePassword=1234\nClientUUID=u1\nSourceID=1\n"
        );
    }

    #[test]
    fn test_build_sample_archive_entries() {
        let dir = tempfile::TempDir::new().expect("temp dir");
        let path = dir.path().join("invoice.pdf");
        fs::write(&path, b"%PDF-1.7 sample").expect("write sample");

        let archive =
            build_sample_archive(&path, "secret", &identity(), &fixed_time()).expect("archive");

        let sample_sha1 = sha1_hex(b"%PDF-1.7 sample");
        assert_eq!(archive.sample_sha1, sample_sha1);
        assert_eq!(archive.sha1, sha1_hex(&archive.bytes));
        assert_eq!(
            archive.file_name,
            format!("20261016-120509_{}.zip", archive.sha1)
        );

        let entries = read_entries(&archive.bytes);
        let names: Vec<&str> = entries.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(
            names,
            vec![
                format!("{sample_sha1}.meta"),
                format!("{sample_sha1}.log"),
                format!("{sample_sha1}.dat"),
            ]
        );
        assert_eq!(entries[2].1, b"%PDF-1.7 sample");

        let meta = String::from_utf8(entries[0].1.clone()).expect("utf8 meta");
        assert!(meta.contains("OrigFileName=invoice.pdf\n"));
        assert!(meta.contains("ArchivePassword=secret\n"));
        assert_eq!(
            String::from_utf8(entries[1].1.clone()).expect("utf8 log"),
            "Date=10%2f16%2f2026%2012%3A05%3A09"
        );
    }

    #[test]
    fn test_build_leaves_no_files_behind() {
        let dir = tempfile::TempDir::new().expect("temp dir");
        let path = dir.path().join("sample.bin");
        fs::write(&path, b"payload").expect("write sample");

        build_sample_archive(&path, "1234", &identity(), &Local::now()).expect("archive");

        let files: Vec<_> = fs::read_dir(dir.path()).expect("read dir").collect();
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn test_missing_sample() {
        let dir = tempfile::TempDir::new().expect("temp dir");
        let err = build_sample_archive(
            &dir.path().join("missing.bin"),
            "1234",
            &identity(),
            &fixed_time(),
        )
        .expect_err("missing sample");
        assert!(matches!(err.current_context(), DdanError::Io { .. }));
    }
}
