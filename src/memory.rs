use crate::device::Keyboard;
use crate::image::Image;

/// LC3 can address 128KB of memory.
pub const MEMORY_MAX: usize = 0x10000;

/// Keyboard status register. Bit 15 is set when a key is waiting in [`KBDR`].
pub const KBSR: u16 = 0xFE00;
/// Keyboard data register. Low byte holds the last key read.
pub const KBDR: u16 = 0xFE02;

/// 65536 16-bit cells. Every `u16` is a valid address.
#[derive(Clone, PartialEq, Eq)]
pub struct Memory {
    mem: Box<[u16]>,
}

impl Memory {
    pub fn new() -> Self {
        Self {
            mem: vec![0; MEMORY_MAX].into_boxed_slice(),
        }
    }

    /// Read a cell as the running program sees it.
    ///
    /// Reading [`KBSR`] polls `keyboard` first, latching any pending key into [`KBDR`].
    pub fn read<K>(&mut self, addr: u16, keyboard: &mut K) -> u16
    where
        K: Keyboard + ?Sized,
    {
        if addr == KBSR {
            match keyboard.poll() {
                Some(key) => {
                    self.mem[KBSR as usize] = 0x8000;
                    self.mem[KBDR as usize] = key as u16;
                }
                None => self.mem[KBSR as usize] = 0,
            }
        }
        self.mem[addr as usize]
    }

    /// Read a cell without touching any device.
    #[inline]
    pub fn peek(&self, addr: u16) -> u16 {
        self.mem[addr as usize]
    }

    #[inline]
    pub fn write(&mut self, addr: u16, val: u16) {
        self.mem[addr as usize] = val;
    }

    /// Copy an image to its origin, wrapping past `0xFFFF`. Returns the origin.
    pub fn load(&mut self, image: &Image) -> u16 {
        let mut addr = image.origin;
        for &word in &image.words {
            self.write(addr, word);
            addr = addr.wrapping_add(1);
        }
        tracing::debug!(
            origin = format!("0x{:04X}", image.origin),
            words = image.words.len(),
            "loaded image"
        );
        image.origin
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Memory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let used = self.mem.iter().filter(|&&cell| cell != 0).count();
        f.debug_struct("Memory")
            .field("nonzero_cells", &used)
            .finish()
    }
}
