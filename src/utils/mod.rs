pub mod sync_flag;
pub mod user_io;
