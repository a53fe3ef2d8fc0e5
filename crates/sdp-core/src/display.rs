// Text rendering of session descriptions
//
// Used for log output; the rendering follows RFC 4566 line order but no
// attempt is made at bit-exact wire compliance.

use std::fmt;

use crate::types::{ConnectionData, MediaDescription, Origin, SessionDescription};

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} {} {}",
            self.username,
            self.sess_id,
            self.sess_version,
            self.net_type,
            self.addr_type,
            self.unicast_address
        )
    }
}

impl fmt::Display for ConnectionData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.net_type, self.addr_type, self.connection_address)
    }
}

impl fmt::Display for MediaDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "m={} {} {}", self.media, self.port, self.protocol)?;
        for format in &self.formats {
            write!(f, " {}", format)?;
        }
        f.write_str("\r\n")?;
        if let Some(connection) = &self.connection_info {
            write!(f, "c={}\r\n", connection)?;
        }
        for attribute in &self.attributes {
            write!(f, "a={}\r\n", attribute)?;
        }
        Ok(())
    }
}

impl fmt::Display for SessionDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v={}\r\n", self.version)?;
        if let Some(origin) = &self.origin {
            write!(f, "o={}\r\n", origin)?;
        }
        write!(f, "s={}\r\n", self.session_name)?;
        if let Some(connection) = &self.connection_info {
            write!(f, "c={}\r\n", connection)?;
        }
        f.write_str("t=0 0\r\n")?;
        for attribute in &self.attributes {
            write!(f, "a={}\r\n", attribute)?;
        }
        for media in self.media_descriptions().unwrap_or_default() {
            write!(f, "{}", media)?;
        }
        Ok(())
    }
}
