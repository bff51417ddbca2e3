// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Host identity helpers for sample fields.
//!
//! Looked up once per process and cached.

use std::sync::OnceLock;

struct HostIdentity {
    hostname: String,
    os_name: String,
    release: String,
}

static IDENTITY: OnceLock<HostIdentity> = OnceLock::new();

fn identity() -> &'static HostIdentity {
    IDENTITY.get_or_init(HostIdentity::detect)
}

/// Host name of this machine (empty if unknown).
pub fn hostname() -> &'static str {
    &identity().hostname
}

/// Operating system name and kernel release, e.g. `"Linux 6.1.0-13-amd64"`.
pub fn kernel_version() -> &'static str {
    &identity().release
}

/// Operating system name, e.g. `"Linux"`.
pub fn os_name() -> &'static str {
    &identity().os_name
}

impl HostIdentity {
    #[cfg(unix)]
    fn detect() -> Self {
        // SAFETY:
        // - utsname is a POD type that can be safely zero-initialized
        // - All fields are arrays of c_char, which have no invalid bit patterns
        let mut uts: libc::utsname = unsafe { std::mem::zeroed() };
        // SAFETY:
        // - &mut uts is a valid pointer to a properly sized utsname struct
        // - uname() writes NUL-terminated strings into every field on success
        let ret = unsafe { libc::uname(&mut uts) };
        if ret < 0 {
            tracing::debug!(error = %std::io::Error::last_os_error(), "uname failed");
            return Self::fallback();
        }

        let hostname = c_field(&uts.nodename);
        let os_name = c_field(&uts.sysname);
        let release = format!("{} {}", os_name, c_field(&uts.release));
        Self {
            hostname,
            os_name,
            release,
        }
    }

    #[cfg(not(unix))]
    fn detect() -> Self {
        Self::fallback()
    }

    fn fallback() -> Self {
        let os_name = std::env::consts::OS.to_string();
        Self {
            hostname: std::env::var("HOSTNAME")
                .or_else(|_| std::env::var("COMPUTERNAME"))
                .unwrap_or_default(),
            release: os_name.clone(),
            os_name,
        }
    }
}

/// Convert a fixed-size, NUL-terminated `utsname` field.
#[cfg(unix)]
fn c_field(raw: &[libc::c_char]) -> String {
    let bytes: Vec<u8> = raw
        .iter()
        .take_while(|c| **c != 0)
        .map(|c| *c as u8)
        .collect();
    String::from_utf8_lossy(&bytes).into_owned()
}
