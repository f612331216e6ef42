use cpn_core::common::{AccessSize, CpnResult, Request, Response};
use cpn_core::soc::devices::Device;

/// Plain RAM claiming `[base, base + size)` on the bus.
#[derive(Debug)]
pub struct MockMemory {
    name: String,
    base: u64,
    data: Vec<u8>,
}

impl MockMemory {
    pub fn new(name: &str, base: u64, size: usize) -> Self {
        Self {
            name: name.to_owned(),
            base,
            data: vec![0; size],
        }
    }

    fn span(offset: u64, size: AccessSize) -> std::ops::Range<usize> {
        let start = offset as usize;
        start..start + size.bytes() as usize
    }
}

impl Device for MockMemory {
    fn name(&self) -> &str {
        &self.name
    }

    fn address_range(&self) -> (u64, u64) {
        (self.base, self.data.len() as u64)
    }

    fn access(&mut self, req: &Request) -> CpnResult<Response> {
        let span = Self::span(req.addr, req.size);
        if req.is_write {
            let bytes = req.data.to_le_bytes();
            self.data[span.clone()].copy_from_slice(&bytes[..span.len()]);
            return Ok(Response::ack());
        }
        let mut buf = [0u8; 8];
        buf[..span.len()].copy_from_slice(&self.data[span]);
        Ok(Response::data(u64::from_le_bytes(buf)))
    }
}
