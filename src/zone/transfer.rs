use super::{
    error::{Error, Result},
    records::{relative_name, Collector, RecordSet},
};
use crate::config::Transfer;
use hickory_proto::{
    op::{Message, MessageType, OpCode, Query, ResponseCode},
    rr::{Name, RData, Record, RecordType},
};
use itertools::Itertools;
use std::{fmt::Write as _, io::ErrorKind, str::FromStr, time::Duration};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpStream,
    time::timeout,
};
use tracing::{debug, info, instrument, warn};

/// Transfer the full contents of a zone from the server
///
/// The transfer is complete once the closing SOA record is received. Records are
/// grouped by their owner name relative to the zone origin.
#[instrument(skip(config), fields(port = config.port))]
pub async fn fetch(server: &str, zone: &str, config: &Transfer) -> Result<Vec<RecordSet>> {
    let origin = parse_origin(zone)?;
    let deadline = Duration::from_secs(config.timeout);

    let mut stream = timeout(deadline, TcpStream::connect((server, config.port)))
        .await
        .map_err(|_| Error::Timeout)?
        .map_err(|source| Error::Connect {
            server: format!("{}:{}", server, config.port),
            source,
        })?;

    let id = rand::random::<u16>();
    send_query(&mut stream, id, &origin).await?;
    debug!(id, "sent transfer request");

    let origin_text = origin.to_ascii();
    let mut collector = Collector::default();
    let mut soa_seen = 0;
    let mut messages = 0;
    let mut records = 0;

    'transfer: loop {
        let response = timeout(deadline, read_message(&mut stream))
            .await
            .map_err(|_| Error::Timeout)??;
        check_response(&response, id)?;
        messages += 1;

        for record in response.answers() {
            if record.record_type() == RecordType::SOA {
                soa_seen += 1;
                if soa_seen == 2 {
                    break 'transfer;
                }
            } else if soa_seen == 0 {
                return Err(Error::Malformed(
                    "transfer did not start with an SOA record".into(),
                ));
            }

            match render(record) {
                Some(value) => {
                    let name = relative_name(&record.name().to_ascii(), &origin_text);
                    collector.add(name, &record.record_type().to_string(), record.ttl(), value);
                    records += 1;
                }
                None => warn!(name = %record.name(), "skipping record without data"),
            }
        }
    }

    let sets = collector.finish();
    info!(messages, records, owners = sets.len(), "zone transfer complete");

    Ok(sets)
}

/// Parse the zone into a fully-qualified name
fn parse_origin(zone: &str) -> Result<Name> {
    let fqdn = format!("{}.", zone.trim_end_matches('.'));
    Name::from_str(&fqdn).map_err(|e| Error::InvalidZone(zone.to_owned(), e))
}

/// Send the AXFR query using TCP length-prefixed framing
async fn send_query(stream: &mut TcpStream, id: u16, origin: &Name) -> Result<()> {
    let mut message = Message::new();
    message
        .set_id(id)
        .set_message_type(MessageType::Query)
        .set_op_code(OpCode::Query)
        .add_query(Query::query(origin.clone(), RecordType::AXFR));

    let encoded = message.to_vec()?;
    let length = u16::try_from(encoded.len())
        .map_err(|_| Error::Malformed("query exceeds maximum message size".into()))?;

    let mut frame = Vec::with_capacity(encoded.len() + 2);
    frame.extend_from_slice(&length.to_be_bytes());
    frame.extend_from_slice(&encoded);

    stream.write_all(&frame).await?;
    stream.flush().await?;

    Ok(())
}

/// Read a single length-prefixed message from the stream
async fn read_message(stream: &mut TcpStream) -> Result<Message> {
    let length = match stream.read_u16().await {
        Ok(length) => length,
        Err(e) if e.kind() == ErrorKind::UnexpectedEof => {
            return Err(Error::Malformed(
                "connection closed before the transfer completed".into(),
            ))
        }
        Err(e) => return Err(e.into()),
    };

    let mut buffer = vec![0; usize::from(length)];
    stream.read_exact(&mut buffer).await?;

    Ok(Message::from_vec(&buffer)?)
}

/// Ensure the response belongs to our query and was successful
fn check_response(response: &Message, id: u16) -> Result<()> {
    if response.message_type() != MessageType::Response {
        return Err(Error::Malformed("server did not send a response".into()));
    }
    if response.id() != id {
        return Err(Error::Malformed(format!(
            "expected message id {} but got {}",
            id,
            response.id()
        )));
    }

    match response.response_code() {
        ResponseCode::NoError => Ok(()),
        code => Err(Error::Refused(code)),
    }
}

/// Render the record data in its zone file text form
fn render(record: &Record) -> Option<String> {
    match record.data()? {
        RData::TXT(txt) => Some(txt.txt_data().iter().map(|s| quote(s)).join(" ")),
        data => Some(data.to_string()),
    }
}

/// Quote a TXT character-string, escaping anything nsupdate would misread
fn quote(data: &[u8]) -> String {
    let mut quoted = String::with_capacity(data.len() + 2);
    quoted.push('"');
    for &byte in data {
        match byte {
            b'"' | b'\\' => {
                quoted.push('\\');
                quoted.push(char::from(byte));
            }
            0x20..=0x7e => quoted.push(char::from(byte)),
            _ => {
                let _ = write!(quoted, "\\{:03}", byte);
            }
        }
    }
    quoted.push('"');
    quoted
}
