//! Decoder configuration.

/// Limits and switches for [`Http1Decoder`](crate::Http1Decoder).
#[derive(Debug, Clone)]
pub struct DecoderConfig {
    max_initial_line_length: usize,
    max_header_size: usize,
    max_chunk_size: usize,
    chunked_supported: bool,
    validate_headers: bool,
    initial_buffer_size: usize,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            max_initial_line_length: 4096,
            max_header_size: 8192,
            max_chunk_size: 8192,
            chunked_supported: true,
            validate_headers: true,
            initial_buffer_size: 128,
        }
    }
}

impl DecoderConfig {
    /// Cap on the initial request/status line, in bytes.
    pub fn with_max_initial_line_length(mut self, max: usize) -> Self {
        self.max_initial_line_length = max;
        self
    }

    /// Cap on the combined size of a message's header block, in bytes.
    pub fn with_max_header_size(mut self, max: usize) -> Self {
        self.max_header_size = max;
        self
    }

    /// Upper bound on the size of a single emitted content chunk.
    pub fn with_max_chunk_size(mut self, max: usize) -> Self {
        self.max_chunk_size = max;
        self
    }

    /// Whether chunked transfer encoding is accepted.
    pub fn with_chunked_supported(mut self, supported: bool) -> Self {
        self.chunked_supported = supported;
        self
    }

    /// Whether header names are checked for illegal bytes.
    pub fn with_validate_headers(mut self, validate: bool) -> Self {
        self.validate_headers = validate;
        self
    }

    /// Initial capacity of the scanners' scratch buffers.
    pub fn with_initial_buffer_size(mut self, size: usize) -> Self {
        self.initial_buffer_size = size;
        self
    }

    pub fn max_initial_line_length(&self) -> usize {
        self.max_initial_line_length
    }

    pub fn max_header_size(&self) -> usize {
        self.max_header_size
    }

    pub fn max_chunk_size(&self) -> usize {
        self.max_chunk_size
    }

    pub fn chunked_supported(&self) -> bool {
        self.chunked_supported
    }

    pub fn validate_headers(&self) -> bool {
        self.validate_headers
    }

    pub fn initial_buffer_size(&self) -> usize {
        self.initial_buffer_size
    }
}
