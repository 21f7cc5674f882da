//! Encoders for the argv/envp arrays handed to `posix_spawn`.

use std::collections::HashMap;
use std::ffi::{CStr, CString};
use std::os::unix::ffi::OsStrExt;
use std::path::Path;
use std::ptr;

use libc::c_char;

use crate::types::{ProcessError, Result};

/// Owned C strings plus a NULL-terminated pointer array into them.
///
/// The pointers stay valid because `strings` is never mutated after
/// construction and `CString` heap buffers do not move.
struct CStringArray {
    strings: Vec<CString>,
    pointers: Vec<*mut c_char>,
}

impl CStringArray {
    fn new(strings: Vec<CString>) -> Self {
        let mut pointers: Vec<*mut c_char> = strings
            .iter()
            .map(|s| s.as_ptr() as *mut c_char)
            .collect();
        pointers.push(ptr::null_mut());
        Self { strings, pointers }
    }

    fn as_ptr(&self) -> *const *mut c_char {
        self.pointers.as_ptr()
    }

    fn entries(&self) -> impl Iterator<Item = &CStr> {
        self.strings.iter().map(CString::as_c_str)
    }
}

fn to_cstring(bytes: &[u8], what: &str) -> Result<CString> {
    CString::new(bytes).map_err(|_| {
        ProcessError::InvalidArgument(format!(
            "{} contains an interior NUL byte: {:?}",
            what,
            String::from_utf8_lossy(bytes)
        ))
    })
}

/// `argv` for the child: the executable path followed by the arguments.
pub struct ProcessArguments {
    array: CStringArray,
}

impl ProcessArguments {
    pub fn encode(executable: &Path, arguments: &[String]) -> Result<Self> {
        let mut strings = Vec::with_capacity(arguments.len() + 1);
        strings.push(to_cstring(executable.as_os_str().as_bytes(), "executable path")?);
        for arg in arguments {
            strings.push(to_cstring(arg.as_bytes(), "argument")?);
        }
        Ok(Self {
            array: CStringArray::new(strings),
        })
    }

    /// Pointer suitable for the `argv` parameter.
    pub fn as_ptr(&self) -> *const *mut c_char {
        self.array.as_ptr()
    }

    /// Path of the executable (`argv[0]`).
    pub fn program(&self) -> &CStr {
        &self.array.strings[0]
    }

    /// Number of entries, not counting the NULL terminator.
    pub fn len(&self) -> usize {
        self.array.strings.len()
    }

    /// Always false: `argv[0]` is the executable.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Lossy string copies of every entry, for diagnostics.
    pub fn to_strings(&self) -> Vec<String> {
        self.array
            .entries()
            .map(|s| s.to_string_lossy().into_owned())
            .collect()
    }
}

/// `envp` for the child: one `KEY=VALUE` entry per variable.
pub struct ProcessEnvironment {
    array: CStringArray,
}

impl ProcessEnvironment {
    pub fn encode(environment: &HashMap<String, String>) -> Result<Self> {
        let mut strings = Vec::with_capacity(environment.len());
        for (key, value) in environment {
            if key.is_empty() || key.contains('=') {
                return Err(ProcessError::InvalidArgument(format!(
                    "invalid environment variable name: {:?}",
                    key
                )));
            }
            let entry = format!("{}={}", key, value);
            strings.push(to_cstring(entry.as_bytes(), "environment entry")?);
        }
        Ok(Self {
            array: CStringArray::new(strings),
        })
    }

    /// Pointer suitable for the `envp` parameter.
    pub fn as_ptr(&self) -> *const *mut c_char {
        self.array.as_ptr()
    }

    pub fn len(&self) -> usize {
        self.array.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.array.strings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    unsafe fn collect(mut ptr: *const *mut c_char) -> Vec<String> {
        let mut out = Vec::new();
        unsafe {
            while !(*ptr).is_null() {
                out.push(CStr::from_ptr(*ptr).to_string_lossy().into_owned());
                ptr = ptr.add(1);
            }
        }
        out
    }

    #[test]
    fn test_arguments_are_null_terminated() {
        let args = vec!["-c".to_string(), "echo hi".to_string()];
        let encoded = ProcessArguments::encode(Path::new("/bin/sh"), &args).unwrap();

        assert_eq!(encoded.len(), 3);
        assert_eq!(encoded.program().to_str().unwrap(), "/bin/sh");
        let decoded = unsafe { collect(encoded.as_ptr()) };
        assert_eq!(decoded, vec!["/bin/sh", "-c", "echo hi"]);
        assert_eq!(encoded.to_strings(), decoded);
    }

    #[test]
    fn test_empty_arguments() {
        let encoded = ProcessArguments::encode(Path::new("/bin/true"), &[]).unwrap();
        assert_eq!(unsafe { collect(encoded.as_ptr()) }, vec!["/bin/true"]);
    }

    #[test]
    fn test_argument_with_nul_rejected() {
        let args = vec!["bad\0arg".to_string()];
        let err = ProcessArguments::encode(Path::new("/bin/echo"), &args)
            .err()
            .unwrap();
        assert!(matches!(err, ProcessError::InvalidArgument(_)));
    }

    #[test]
    fn test_environment_entries() {
        let mut env = HashMap::new();
        env.insert("A".to_string(), "1".to_string());
        env.insert("EMPTY".to_string(), String::new());
        env.insert("WITH_EQ".to_string(), "x=y".to_string());

        let encoded = ProcessEnvironment::encode(&env).unwrap();
        assert_eq!(encoded.len(), 3);

        let mut decoded = unsafe { collect(encoded.as_ptr()) };
        decoded.sort();
        assert_eq!(decoded, vec!["A=1", "EMPTY=", "WITH_EQ=x=y"]);
    }

    #[test]
    fn test_empty_environment() {
        let encoded = ProcessEnvironment::encode(&HashMap::new()).unwrap();
        assert!(encoded.is_empty());
        assert!(unsafe { collect(encoded.as_ptr()) }.is_empty());
    }

    #[test]
    fn test_invalid_environment_names() {
        for key in ["", "A=B", "NUL\0"] {
            let mut env = HashMap::new();
            env.insert(key.to_string(), "v".to_string());
            let err = ProcessEnvironment::encode(&env).err().unwrap();
            assert!(matches!(err, ProcessError::InvalidArgument(_)), "key {:?}", key);
        }
    }
}
