pub const HEADER_PROTOCOL_VERSION: &str = "X-DTAS-ProtocolVersion";
pub const HEADER_TIME: &str = "X-DTAS-Time";
pub const HEADER_CHALLENGE: &str = "X-DTAS-Challenge";
pub const HEADER_CHECKSUM: &str = "X-DTAS-Checksum";
pub const HEADER_CHECKSUM_CALCULATING_ORDER: &str = "X-DTAS-ChecksumCalculatingOrder";

pub const HEADER_PRODUCT_NAME: &str = "X-DTAS-ProductName";
pub const HEADER_CLIENT_HOSTNAME: &str = "X-DTAS-ClientHostname";
pub const HEADER_CLIENT_UUID: &str = "X-DTAS-ClientUUID";
pub const HEADER_SOURCE_ID: &str = "X-DTAS-SourceID";
pub const HEADER_SOURCE_NAME: &str = "X-DTAS-SourceName";
pub const HEADER_LAST_QUERY_ID: &str = "X-DTAS-LastQueryID";
pub const HEADER_SHA1: &str = "X-DTAS-SHA1";
pub const HEADER_SAMPLE_TYPE: &str = "X-DTAS-SampleType";
pub const HEADER_ARCHIVE_SHA1: &str = "X-DTAS-Archive-SHA1";
pub const HEADER_ARCHIVE_FILENAME: &str = "X-DTAS-Archive-Filename";
pub const HEADER_REPORT_TYPE: &str = "X-DTAS-ReportType";

pub const DEFAULT_PROTOCOL_VERSION: &str = "1.5";
pub const DEFAULT_PRODUCT_NAME: &str = "TDA";
/// Source id `1` marks a user submission.
pub const DEFAULT_SOURCE_ID: &str = "1";
pub const DEFAULT_SOURCE_NAME: &str = "ddpyclient";
pub const DEFAULT_ARCHIVE_PASSWORD: &str = "1234";

/// Sample type for file submissions (`1` would be a URL).
pub const SAMPLE_TYPE_FILE: &str = "0";

pub const SAMPLE_UPLOAD_BASE_PATH: &str = "/web_service/sample_upload";
pub const ENDPOINT_REGISTER: &str = "register";
pub const ENDPOINT_TEST_CONNECTION: &str = "test_connection";
pub const ENDPOINT_GET_BLACK_LISTS: &str = "get_black_lists";
pub const ENDPOINT_SIMPLE_UPLOAD_SAMPLE: &str = "simple_upload_sample";
pub const ENDPOINT_UPLOAD_SAMPLE: &str = "upload_sample";
pub const ENDPOINT_GET_REPORT: &str = "get_report";

pub const FORM_FIELD_UPLOAD_SAMPLE: &str = "uploadsample";
pub const FORM_FIELD_ARCHIVE: &str = "Archive.zip";
