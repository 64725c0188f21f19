//! Static-site deploy providers.

mod netlify;

pub use netlify::{NetlifyConfig, NetlifyDeployProvider};
