pub const INDEX_PATH: &str = "/";
pub const DECODE_PATH: &str = "/decode";

pub const GET: &str = "GET";
pub const POST: &str = "POST";

pub const HTTP_1_0: &str = "HTTP/1.0";
pub const HTTP_1_1: &str = "HTTP/1.1";
