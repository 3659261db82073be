//! `cdm_layout` global configuration options.

use std::sync::{OnceLock, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Global configuration options for the `cdm_layout` crate.
///
/// Retrieve the global [`Config`] with [`global_config`] and modify it with [`global_config_mut`].
///
/// ## Validate Checksums
///  > default: [`true`]
///
/// If enabled, the `fletcher32` tile filter validates that decoded tiles match their stored checksum, otherwise validation is skipped.
///
/// ## Tolerate Truncated Records
///  > default: [`true`]
///
/// The final record of a record-segmented variable is often shorter than the record stride, because writers do not pad the end of the file.
/// If enabled, a read of the final record that runs past the end of the source copies the available bytes and zero fills the remainder.
/// If disabled, such a read is an error.
///
/// ## Decoded Tile Cache Limit
///  > default: `64`
///
/// The number of decoded tiles a [`LayoutBBTiled`](crate::LayoutBBTiled) may hold while walking a section.
/// Tiles are released once the walk has passed their row band.
/// The cache always holds every intersecting tile of the widest row band, so this limit is a floor and a band wider than the limit is still decoded once per tile.
#[derive(Debug)]
pub struct Config {
    validate_checksums: bool,
    tolerate_truncated_records: bool,
    decoded_tile_cache_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            validate_checksums: true,
            tolerate_truncated_records: true,
            decoded_tile_cache_limit: 64,
        }
    }
}

impl Config {
    /// Get the [validate checksums](#validate-checksums) configuration.
    #[must_use]
    pub fn validate_checksums(&self) -> bool {
        self.validate_checksums
    }

    /// Set the [validate checksums](#validate-checksums) configuration.
    pub fn set_validate_checksums(&mut self, validate_checksums: bool) -> &mut Self {
        self.validate_checksums = validate_checksums;
        self
    }

    /// Get the [tolerate truncated records](#tolerate-truncated-records) configuration.
    #[must_use]
    pub fn tolerate_truncated_records(&self) -> bool {
        self.tolerate_truncated_records
    }

    /// Set the [tolerate truncated records](#tolerate-truncated-records) configuration.
    pub fn set_tolerate_truncated_records(&mut self, tolerate_truncated_records: bool) -> &mut Self {
        self.tolerate_truncated_records = tolerate_truncated_records;
        self
    }

    /// Get the [decoded tile cache limit](#decoded-tile-cache-limit) configuration.
    #[must_use]
    pub fn decoded_tile_cache_limit(&self) -> usize {
        self.decoded_tile_cache_limit
    }

    /// Set the [decoded tile cache limit](#decoded-tile-cache-limit) configuration.
    pub fn set_decoded_tile_cache_limit(&mut self, decoded_tile_cache_limit: usize) -> &mut Self {
        self.decoded_tile_cache_limit = decoded_tile_cache_limit;
        self
    }
}

static CONFIG: OnceLock<RwLock<Config>> = OnceLock::new();

/// Returns a reference to the global `cdm_layout` configuration.
///
/// # Panics
/// This function panics if the underlying lock has been poisoned and might panic if the global config is already held by the current thread.
pub fn global_config() -> RwLockReadGuard<'static, Config> {
    CONFIG
        .get_or_init(|| RwLock::new(Config::default()))
        .read()
        .unwrap()
}

/// Returns a mutable reference to the global `cdm_layout` configuration.
///
/// # Panics
/// This function panics if the underlying lock has been poisoned and might panic if the global config is already held by the current thread.
pub fn global_config_mut() -> RwLockWriteGuard<'static, Config> {
    CONFIG
        .get_or_init(|| RwLock::new(Config::default()))
        .write()
        .unwrap()
}

#[cfg(test)]
mod tests {
    use serial_test::serial;

    use super::*;

    #[test]
    #[serial]
    fn config_validate_checksums() {
        assert!(global_config().validate_checksums());
        global_config_mut().set_validate_checksums(false);
        assert!(!global_config().validate_checksums());
        global_config_mut().set_validate_checksums(true);
    }

    #[test]
    #[serial]
    fn config_decoded_tile_cache_limit() {
        assert_eq!(global_config().decoded_tile_cache_limit(), 64);
        global_config_mut()
            .set_decoded_tile_cache_limit(2)
            .set_tolerate_truncated_records(false);
        assert_eq!(global_config().decoded_tile_cache_limit(), 2);
        assert!(!global_config().tolerate_truncated_records());
        global_config_mut()
            .set_decoded_tile_cache_limit(64)
            .set_tolerate_truncated_records(true);
    }
}
