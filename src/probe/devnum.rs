// file: src/probe/devnum.rs
// version: 1.1.0
// guid: 6a92c0e5-d84b-41f7-a3c6-2f7b15e9d08a

//! Device number decoding through the platform's own macros

/// Major number of a `st_dev`/`st_rdev` value
pub fn major(dev: u64) -> u32 {
    libc::major(dev as libc::dev_t)
}

/// Minor number of a `st_dev`/`st_rdev` value
pub fn minor(dev: u64) -> u32 {
    libc::minor(dev as libc::dev_t)
}

/// `major:minor` as used under `/sys/dev/block`
pub fn dev_id(dev: u64) -> String {
    format!("{}:{}", major(dev), minor(dev))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::os::unix::fs::MetadataExt;

    #[test]
    fn test_small_numbers() {
        let dev = libc::makedev(253, 3);
        assert_eq!(major(dev), 253);
        assert_eq!(minor(dev), 3);
        assert_eq!(dev_id(dev), "253:3");
    }

    #[test]
    fn test_large_minor() {
        let dev = libc::makedev(259, 300);
        assert_eq!(major(dev), 259);
        assert_eq!(minor(dev), 300);
        assert_eq!(dev_id(dev), "259:300");
    }

    #[test]
    fn test_matches_sysfs_dev_attribute() {
        // /dev/null is 1:3 on every Linux system
        let rdev = fs::metadata("/dev/null").unwrap().rdev();
        assert_eq!(dev_id(rdev), "1:3");
    }
}
