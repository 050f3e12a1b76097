pub const HASH_SIZE: usize = 32;
pub const HASH_HEX_SIZE: usize = HASH_SIZE * 2;
pub const DEFAULT_DIFFICULTY: u32 = 4;
pub const DEFAULT_MINING_REWARD: u64 = 100;
/// 2024-06-26T00:00:00Z in milliseconds.
pub const GENESIS_TIMESTAMP: u64 = 1_719_360_000_000;
pub const GENESIS_DATA: &str = "Genesis Block";
pub const ENCODING_VERSION: u8 = 1;
pub const NONCE_BATCH: u64 = 1 << 14;
