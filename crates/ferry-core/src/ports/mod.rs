//! Ports - 抽象化レイヤー
//!
//! 外部コラボレータ（永続化ストア、接続シグナル）と、
//! テスト容易性のための時刻・ID 生成をここで trait として定義します。

pub mod clock;
pub mod connectivity;
pub mod id_generator;
pub mod kv_store;

pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::connectivity::ConnectivitySource;
pub use self::id_generator::{IdGenerator, UlidGenerator};
pub use self::kv_store::KeyValueStore;
