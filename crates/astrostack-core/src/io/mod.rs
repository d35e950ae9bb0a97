pub mod image_io;

pub use image_io::{decode_frame, load_frame, save_frame, save_png, save_tiff};
