use flate2::Compression;
use flate2::write::GzEncoder;
use std::io::Write;

#[derive(Debug, Clone)]
pub struct TestCase {
    name: &'static str,
    group: TestGroup,
    input: TestInput,
}

impl TestCase {
    pub fn new(name: &'static str, group: TestGroup, input: TestInput) -> Self {
        Self { name, group, input }
    }

    pub fn small(name: &'static str, input: TestInput) -> Self {
        Self::new(name, TestGroup::Small, input)
    }

    pub fn normal(name: &'static str, input: TestInput) -> Self {
        Self::new(name, TestGroup::Normal, input)
    }

    pub fn large(name: &'static str, input: TestInput) -> Self {
        Self::new(name, TestGroup::Large, input)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn group(&self) -> TestGroup {
        self.group
    }

    pub fn input(&self) -> &TestInput {
        &self.input
    }
}

/// A gzip encoded payload, delivered in pieces of `chunk_size` bytes.
#[derive(Debug, Clone)]
pub struct TestInput {
    payload_len: usize,
    encoded: Vec<u8>,
    chunk_size: usize,
}

impl TestInput {
    /// Encodes `payload_len` bytes of repetitive text.
    pub fn text(payload_len: usize, chunk_size: usize) -> Self {
        let payload: Vec<u8> =
            b"GET /index.html HTTP/1.1\r\nHost: example.com\r\n\r\n".iter().copied().cycle().take(payload_len).collect();
        Self::encode(&payload, chunk_size)
    }

    /// Encodes `payload_len` bytes that barely compress.
    pub fn noise(payload_len: usize, chunk_size: usize) -> Self {
        let mut state: u32 = 0x1234_5678;
        let payload: Vec<u8> = (0..payload_len)
            .map(|_| {
                // xorshift32
                state ^= state << 13;
                state ^= state >> 17;
                state ^= state << 5;
                state.to_le_bytes()[0]
            })
            .collect();
        Self::encode(&payload, chunk_size)
    }

    fn encode(payload: &[u8], chunk_size: usize) -> Self {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(payload).expect("writing to a vec should not fail");
        let encoded = encoder.finish().expect("writing to a vec should not fail");
        Self { payload_len: payload.len(), encoded, chunk_size }
    }

    pub fn payload_len(&self) -> usize {
        self.payload_len
    }

    pub fn chunks(&self) -> impl Iterator<Item = &[u8]> {
        self.encoded.chunks(self.chunk_size)
    }
}

#[derive(Clone, Copy, Debug)]
pub enum TestGroup {
    Small,
    Normal,
    Large,
}

impl TestGroup {
    /// Criterion sample size, fewer samples for slower cases.
    pub fn sample_size(self) -> usize {
        match self {
            TestGroup::Small => 100,
            TestGroup::Normal => 50,
            TestGroup::Large => 10,
        }
    }
}
