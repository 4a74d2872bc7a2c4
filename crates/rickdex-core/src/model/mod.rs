pub mod favorite;
pub mod record;

pub use favorite::FavoriteEntry;
pub use record::{Gender, ParseEnumError, Place, Record, RecordId, Status};
