//! Chat command - stream a reflection on one entry.

use std::io::Read;

use super::{interrupt_token, print_chunk, start_service};

pub(crate) async fn run(text: Option<String>, attach: bool, wait: u64) -> miette::Result<()> {
    let text = match text {
        Some(text) => text,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .map_err(|e| miette::miette!("Failed to read entry from stdin: {}", e))?;
            buf
        }
    };

    let mut service = start_service(attach, wait).await?;
    let cancel = interrupt_token();

    let result = service
        .chat_stream_until(&text, &cancel, print_chunk)
        .await
        .map_err(|e| miette::miette!("{}", e));
    println!();

    if !attach {
        service.shutdown().await.map_err(|e| miette::miette!("{}", e))?;
    }
    result
}
