//! Raw directory enumeration
//!
//! Directory handles are plain file descriptors opened with `open`/`openat`
//! and read with the `getdents64` system call. Handles close themselves on
//! drop, so every exit path of a caller releases them.

use std::ffi::{CString, OsStr, OsString};
use std::fs::File;
use std::io;
use std::mem::offset_of;
use std::os::fd::{AsFd, AsRawFd, BorrowedFd, FromRawFd, OwnedFd};
use std::os::unix::ffi::{OsStrExt, OsStringExt};
use std::path::Path;

#[cfg(not(any(target_os = "linux", target_os = "android")))]
compile_error!("os-find reads directories with getdents64 and only supports Linux");

/// Bytes requested from the kernel per getdents64 call
pub const BUFFER_SIZE: usize = 1024;

const DIR_FLAGS: libc::c_int = libc::O_RDONLY | libc::O_DIRECTORY | libc::O_CLOEXEC;
const FILE_FLAGS: libc::c_int = libc::O_RDONLY | libc::O_CLOEXEC;

const INO_OFFSET: usize = offset_of!(libc::dirent64, d_ino);
const RECLEN_OFFSET: usize = offset_of!(libc::dirent64, d_reclen);
const TYPE_OFFSET: usize = offset_of!(libc::dirent64, d_type);
const NAME_OFFSET: usize = offset_of!(libc::dirent64, d_name);

/// Entry type as reported by the directory stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// Regular file
    File,
    /// Directory
    Directory,
    /// Symbolic link
    Symlink,
    /// Anything else, including entries the filesystem reports as unknown
    Other,
}

impl EntryKind {
    fn from_d_type(d_type: u8) -> Self {
        match d_type {
            libc::DT_REG => EntryKind::File,
            libc::DT_DIR => EntryKind::Directory,
            libc::DT_LNK => EntryKind::Symlink,
            _ => EntryKind::Other,
        }
    }
}

/// One entry decoded from the raw directory stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEntry {
    inode: u64,
    kind: EntryKind,
    name: OsString,
}

impl RawEntry {
    pub fn inode(&self) -> u64 {
        self.inode
    }

    pub fn kind(&self) -> EntryKind {
        self.kind
    }

    pub fn name(&self) -> &OsStr {
        &self.name
    }

    /// `.` or `..`
    pub fn is_pseudo(&self) -> bool {
        matches!(self.name.as_bytes(), b"." | b"..")
    }
}

/// An open, readable directory
#[derive(Debug)]
pub struct DirHandle {
    fd: OwnedFd,
}

impl DirHandle {
    /// Open a directory by path
    pub fn open<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let c_path = to_cstring(path.as_ref().as_os_str())?;
        // SAFETY: c_path is NUL-terminated and outlives the call
        let fd = unsafe { libc::open(c_path.as_ptr(), DIR_FLAGS) };
        Ok(Self { fd: owned_fd(fd)? })
    }

    /// Open a subdirectory of this directory by name
    pub fn open_child(&self, name: &OsStr) -> io::Result<Self> {
        Ok(Self {
            fd: openat(self.fd.as_fd(), name, DIR_FLAGS)?,
        })
    }

    /// Open a file in this directory read-only
    pub fn open_file(&self, name: &OsStr) -> io::Result<File> {
        openat(self.fd.as_fd(), name, FILE_FLAGS).map(File::from)
    }

    /// Lazily enumerate the entries of this directory.
    ///
    /// The stream shares the descriptor's read position, so it is not
    /// restartable: a second call continues where the first stopped.
    pub fn entries(&self) -> DirEntries<'_> {
        DirEntries {
            fd: self.fd.as_fd(),
            buf: vec![0; BUFFER_SIZE],
            pos: 0,
            len: 0,
            finished: false,
        }
    }
}

impl AsFd for DirHandle {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.fd.as_fd()
    }
}

/// Iterator over raw directory entries, `.` and `..` included
pub struct DirEntries<'a> {
    fd: BorrowedFd<'a>,
    buf: Vec<u8>,
    pos: usize,
    len: usize,
    finished: bool,
}

impl DirEntries<'_> {
    /// Refill the buffer; returns the number of valid bytes (0 at end)
    fn fill(&mut self) -> io::Result<usize> {
        // SAFETY: buf is writable for buf.len() bytes and fd is open for
        // the lifetime of this iterator
        let read = unsafe {
            libc::syscall(
                libc::SYS_getdents64,
                self.fd.as_raw_fd() as libc::c_long,
                self.buf.as_mut_ptr(),
                self.buf.len(),
            )
        };
        if read < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(read as usize)
    }
}

impl Iterator for DirEntries<'_> {
    type Item = io::Result<RawEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        if self.pos >= self.len {
            match self.fill() {
                Ok(0) => {
                    self.finished = true;
                    return None;
                }
                Ok(read) => {
                    self.len = read;
                    self.pos = 0;
                }
                Err(err) => {
                    self.finished = true;
                    return Some(Err(err));
                }
            }
        }

        match decode(&self.buf[self.pos..self.len]) {
            Ok((entry, reclen)) => {
                self.pos += reclen;
                Some(Ok(entry))
            }
            Err(err) => {
                self.finished = true;
                Some(Err(err))
            }
        }
    }
}

impl std::iter::FusedIterator for DirEntries<'_> {}

/// Decode the record at the start of `record`, returning it with its length
fn decode(record: &[u8]) -> io::Result<(RawEntry, usize)> {
    if record.len() <= NAME_OFFSET {
        return Err(malformed("truncated directory record"));
    }

    let reclen = u16::from_ne_bytes([record[RECLEN_OFFSET], record[RECLEN_OFFSET + 1]]) as usize;
    if reclen <= NAME_OFFSET || reclen > record.len() {
        return Err(malformed("bad directory record length"));
    }

    let mut ino = [0u8; 8];
    ino.copy_from_slice(&record[INO_OFFSET..INO_OFFSET + 8]);

    let name_bytes = &record[NAME_OFFSET..reclen];
    let name_len = name_bytes
        .iter()
        .position(|&b| b == 0)
        .ok_or_else(|| malformed("unterminated directory entry name"))?;

    let entry = RawEntry {
        inode: u64::from_ne_bytes(ino),
        kind: EntryKind::from_d_type(record[TYPE_OFFSET]),
        name: OsString::from_vec(name_bytes[..name_len].to_vec()),
    };

    Ok((entry, reclen))
}

fn malformed(message: &str) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, message.to_string())
}

fn openat(dir: BorrowedFd<'_>, name: &OsStr, flags: libc::c_int) -> io::Result<OwnedFd> {
    let c_name = to_cstring(name)?;
    // SAFETY: dir is a live descriptor and c_name is NUL-terminated
    let fd = unsafe { libc::openat(dir.as_raw_fd(), c_name.as_ptr(), flags) };
    owned_fd(fd)
}

fn owned_fd(fd: libc::c_int) -> io::Result<OwnedFd> {
    if fd < 0 {
        return Err(io::Error::last_os_error());
    }
    // SAFETY: fd was just returned by the kernel and nothing else owns it
    Ok(unsafe { OwnedFd::from_raw_fd(fd) })
}

fn to_cstring(s: &OsStr) -> io::Result<CString> {
    CString::new(s.as_bytes())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "name contains a NUL byte"))
}
