pub mod memory;
pub mod room_code;
pub mod store;
pub mod subscription;

pub use memory::MemoryStore;
pub use room_code::generate_room_code;
pub use store::{DEFAULT_CHAT_HISTORY, RoomStore, StoreResult};
pub use subscription::Subscription;
