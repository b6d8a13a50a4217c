pub mod banned_peers;
