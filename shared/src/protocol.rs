/// API routes served by the directory daemon
pub const REGISTER_PATH: &str = "/api/register";
pub const DEVICES_PATH: &str = "/api/devices";
pub const ALL_DEVICES_PATH: &str = "/api/alldevices";

/// Header carrying the shared API key
pub const API_KEY_HEADER: &str = "x-api-key";

/// Header a local reverse proxy uses to pass the real client address
pub const REAL_IP_HEADER: &str = "x-real-ip";

/// Partition key for every private or link-local external address
pub const LOCAL_BUCKET: &str = "local";

/// Body returned on successful registration
pub const REGISTER_SUCCESS: &str = "Successfully added!\n";
