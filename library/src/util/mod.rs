pub mod vec_ext;

pub use vec_ext::VecSetExt;
