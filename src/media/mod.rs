//! Source and generated image types.

mod types;

pub use types::{
    encode_data_url, split_data_url, GeneratedImage, ImageFormat, SourceImage,
    DOWNLOAD_FILE_NAME, GENERATED_MIME_TYPE,
};
