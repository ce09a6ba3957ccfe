// Fixtures shared by the unit tests.

use std::io::{BufRead, BufReader, Cursor, Write};
use std::net::TcpListener;
use std::path::Path;

/// 16-bit PCM WAV in memory.
pub fn wav_bytes(channels: u16, sample_rate: u32, samples: &[i16]) -> Vec<u8> {
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut bytes = Vec::new();
    {
        let mut writer = hound::WavWriter::new(Cursor::new(&mut bytes), spec).expect("wav writer");
        for &s in samples {
            writer.write_sample(s).expect("write sample");
        }
        writer.finalize().expect("finalize wav");
    }
    bytes
}

/// Lay out `<root>/<folder>/<file>` with a short mono WAV in each file.
pub fn write_sound_tree(root: &Path, files: &[(&str, &str)]) {
    for (folder, file) in files {
        let dir = root.join(folder);
        std::fs::create_dir_all(&dir).expect("create folder");
        std::fs::write(dir.join(file), wav_bytes(1, 44100, &[0, 1000, -1000, 0])).expect("write wav");
    }
}

/// A loopback HTTP server answering canned responses by request path.
/// Unknown paths get a 404.
pub struct TestServer {
    listener: TcpListener,
    base: String,
}

impl TestServer {
    pub fn bind() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind loopback");
        let base = format!("http://{}", listener.local_addr().expect("local addr"));
        Self { listener, base }
    }

    /// A URL nothing is listening on.
    pub fn closed_url() -> String {
        Self::bind().url("/")
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base)
    }

    pub fn serve(self, routes: Vec<(&'static str, u16, Vec<u8>)>) {
        std::thread::spawn(move || {
            for stream in self.listener.incoming() {
                let Ok(mut stream) = stream else { continue };
                let Ok(read_half) = stream.try_clone() else { continue };
                let mut reader = BufReader::new(read_half);

                let mut request_line = String::new();
                if reader.read_line(&mut request_line).is_err() {
                    continue;
                }
                loop {
                    let mut header = String::new();
                    match reader.read_line(&mut header) {
                        Ok(0) | Err(_) => break,
                        Ok(_) if header == "\r\n" => break,
                        Ok(_) => {}
                    }
                }

                let path = request_line.split_whitespace().nth(1).unwrap_or("/");
                let (status, body) = routes
                    .iter()
                    .find(|(route, ..)| *route == path)
                    .map(|(_, status, body)| (*status, body.as_slice()))
                    .unwrap_or((404, b"not found".as_slice()));
                let head = format!(
                    "HTTP/1.1 {status} Canned\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                    body.len()
                );
                let _ = stream.write_all(head.as_bytes());
                let _ = stream.write_all(body);
                let _ = stream.flush();
            }
        });
    }
}
