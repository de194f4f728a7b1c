pub mod regex_utils;
pub mod s3_utils;
