use crate::util::Address;
use libc::{c_void, PROT_NONE, PROT_READ, PROT_WRITE};
use std::io::{Error, Result};

/// Reserve `size` bytes of address space at an address chosen by the OS, aligned to `align`.
/// The range is inaccessible until [`dzmmap`] commits parts of it.
pub fn mmap_reserve_aligned(size: usize, align: usize) -> Result<Address> {
    // Over-reserve, then trim both ends so the remaining range is aligned.
    let padded = size + align;
    let flags = libc::MAP_ANON | libc::MAP_PRIVATE | libc::MAP_NORESERVE;
    let ptr = unsafe { libc::mmap(std::ptr::null_mut(), padded, PROT_NONE, flags, -1, 0) };
    if ptr == libc::MAP_FAILED {
        return Err(Error::last_os_error());
    }
    let raw = Address::from_mut_ptr(ptr);
    let start = raw.align_up(align);
    let head = start - raw;
    if head > 0 {
        munmap(raw, head)?;
    }
    let tail = padded - head - size;
    if tail > 0 {
        munmap(start + size, tail)?;
    }
    Ok(start)
}

/// Demand-zero mmap:
/// This function guarantees to zero all mapped memory.
pub fn dzmmap(start: Address, size: usize) -> Result<()> {
    let prot = PROT_READ | PROT_WRITE;
    let flags = libc::MAP_ANON | libc::MAP_PRIVATE | libc::MAP_FIXED;
    mmap_fixed(start, size, prot, flags)
}

/// Give the physical memory behind a range back to the OS and make it inaccessible again.
/// The address range itself stays reserved.
pub fn uncommit(start: Address, size: usize) -> Result<()> {
    let flags = libc::MAP_ANON | libc::MAP_PRIVATE | libc::MAP_FIXED | libc::MAP_NORESERVE;
    mmap_fixed(start, size, PROT_NONE, flags)
}

/// Map zeroed, readable and writable memory anywhere. Physical pages are only allocated
/// when touched, so this is suitable for sparse side tables.
pub fn mmap_anon_noreserve(size: usize) -> Result<Address> {
    let prot = PROT_READ | PROT_WRITE;
    let flags = libc::MAP_ANON | libc::MAP_PRIVATE | libc::MAP_NORESERVE;
    let ptr = unsafe { libc::mmap(std::ptr::null_mut(), size, prot, flags, -1, 0) };
    if ptr == libc::MAP_FAILED {
        Err(Error::last_os_error())
    } else {
        Ok(Address::from_mut_ptr(ptr))
    }
}

pub fn munmap(start: Address, size: usize) -> Result<()> {
    wrap_libc_call(&|| unsafe { libc::munmap(start.to_mut_ptr(), size) }, 0)
}

pub fn zero(start: Address, len: usize) {
    let ptr = start.to_mut_ptr::<u8>();
    unsafe { std::ptr::write_bytes(ptr, 0, len) };
}

fn mmap_fixed(start: Address, size: usize, prot: libc::c_int, flags: libc::c_int) -> Result<()> {
    let ptr: *mut c_void = start.to_mut_ptr();
    wrap_libc_call(
        &|| unsafe { libc::mmap(start.to_mut_ptr(), size, prot, flags, -1, 0) },
        ptr,
    )
}

fn wrap_libc_call<T: PartialEq>(f: &dyn Fn() -> T, expect: T) -> Result<()> {
    let ret = f();
    if ret == expect {
        Ok(())
    } else {
        Err(Error::last_os_error())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::constants::{BYTES_IN_CHUNK, BYTES_IN_PAGE};

    #[test]
    fn reserve_commit_uncommit() {
        let size = 2 * BYTES_IN_CHUNK;
        let start = mmap_reserve_aligned(size, BYTES_IN_CHUNK).unwrap();
        assert!(start.is_aligned_to(BYTES_IN_CHUNK));

        dzmmap(start, BYTES_IN_PAGE).unwrap();
        unsafe {
            assert_eq!(start.load::<usize>(), 0);
            start.store::<usize>(42);
            assert_eq!(start.load::<usize>(), 42);
        }
        uncommit(start, BYTES_IN_PAGE).unwrap();
        // Recommitting gives zeroed memory again.
        dzmmap(start, BYTES_IN_PAGE).unwrap();
        unsafe { assert_eq!(start.load::<usize>(), 0) };

        munmap(start, size).unwrap();
    }

    #[test]
    fn anon_side_memory_is_zeroed() {
        let start = mmap_anon_noreserve(4 * BYTES_IN_PAGE).unwrap();
        unsafe {
            assert_eq!((start + 3 * BYTES_IN_PAGE).load::<u64>(), 0);
            start.store::<u64>(7);
        }
        zero(start, 8);
        unsafe { assert_eq!(start.load::<u64>(), 0) };
        munmap(start, 4 * BYTES_IN_PAGE).unwrap();
    }
}
