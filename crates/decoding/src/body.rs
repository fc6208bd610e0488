use crate::config::DecoderConfig;
use crate::decoder::GzipDecoder;
use crate::error::{BoxError, DecodeError};
use crate::source::ChunkedSource;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use http::HeaderMap;
use http_body::{Body, Frame};
use pin_project_lite::pin_project;
use std::pin::Pin;
use std::task::{Context, Poll, ready};
use tracing::{error, trace};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BodyState {
    /// Pulling frames from the inner body
    Reading,
    /// Inner body ended, decoding what is left of the source
    Draining,
    /// Gzip stream complete, trailers pending
    Finishing,
    Done,
}

pin_project! {
    /// A wrapper around a gzip encoded `Body` that yields the decompressed data.
    ///
    /// Each data frame holds at most [`DecoderConfig::buffer_size`] bytes.
    /// Trailers of the inner body are held back until the gzip stream is
    /// complete. After an error the body yields `None`.
    #[derive(Debug)]
    pub struct GzipBody<B> {
        #[pin]
        inner: B,
        decoder: GzipDecoder,
        source: ChunkedSource,
        out: BytesMut,
        max_frame_size: usize,
        // the last decode filled a frame, the source may hold more
        saturated: bool,
        trailers: Option<HeaderMap>,
        state: BodyState,
    }
}

impl<B> GzipBody<B> {
    pub fn new(inner: B) -> Self {
        Self::with_config(inner, DecoderConfig::default())
    }

    pub fn with_config(inner: B, config: DecoderConfig) -> Self {
        Self {
            inner,
            decoder: GzipDecoder::with_config(config),
            source: ChunkedSource::new(),
            out: BytesMut::new(),
            max_frame_size: config.get_buffer_size(),
            saturated: false,
            trailers: None,
            state: BodyState::Reading,
        }
    }
}

impl<B> Body for GzipBody<B>
where
    B: Body,
    B::Error: Into<BoxError>,
{
    type Data = Bytes;
    type Error = DecodeError;

    fn poll_frame(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let mut this = self.project();

        loop {
            match *this.state {
                BodyState::Done => return Poll::Ready(None),
                BodyState::Finishing => {
                    *this.state = BodyState::Done;
                    return Poll::Ready(this.trailers.take().map(|trailers| Ok(Frame::trailers(trailers))));
                }
                BodyState::Reading if !*this.saturated => match ready!(this.inner.as_mut().poll_frame(cx)) {
                    Some(Ok(frame)) => match frame.into_data() {
                        Ok(mut data) => {
                            let bytes = data.copy_to_bytes(data.remaining());
                            trace!(len = bytes.len(), "received gzip encoded bytes");
                            this.source.push(bytes);
                        }
                        Err(frame) => {
                            if let Ok(trailers) = frame.into_trailers() {
                                *this.trailers = Some(trailers);
                            }
                            continue;
                        }
                    },
                    Some(Err(e)) => {
                        *this.state = BodyState::Done;
                        let e = DecodeError::upstream(e);
                        error!(cause = %e, "can't read gzip encoded body");
                        return Poll::Ready(Some(Err(e)));
                    }
                    None => {
                        this.source.finish();
                        *this.state = BodyState::Draining;
                    }
                },
                BodyState::Reading | BodyState::Draining => (),
            }

            let mut sink = (&mut *this.out).limit(*this.max_frame_size);
            if let Err(e) = this.decoder.decode(this.source, &mut sink) {
                *this.state = BodyState::Done;
                error!(cause = %e, "can't decode gzip encoded body");
                return Poll::Ready(Some(Err(e)));
            }
            *this.saturated = !sink.has_remaining_mut();

            if *this.state == BodyState::Draining && this.decoder.is_finished() {
                *this.state = BodyState::Finishing;
            }

            if !this.out.is_empty() {
                return Poll::Ready(Some(Ok(Frame::data(this.out.split().freeze()))));
            }
        }
    }

    fn is_end_stream(&self) -> bool {
        self.state == BodyState::Done
    }
}
