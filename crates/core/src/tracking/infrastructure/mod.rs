pub mod channel_keys;
