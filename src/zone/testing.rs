//! An in-process AXFR responder for tests

use hickory_proto::{
    op::{Message, MessageType, ResponseCode},
    rr::{
        rdata::{A, SOA, TXT},
        Name, RData, Record,
    },
};
use std::{net::SocketAddr, str::FromStr, time::Duration};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{TcpListener, TcpStream},
    time::sleep,
};

pub fn name(raw: &str) -> Name {
    Name::from_str(raw).unwrap()
}

pub fn soa(origin: &str) -> Record {
    Record::from_rdata(
        name(origin),
        3600,
        RData::SOA(SOA::new(
            name(&format!("ns1.{}", origin)),
            name(&format!("hostmaster.{}", origin)),
            2021010101,
            3600,
            600,
            86400,
            300,
        )),
    )
}

pub fn a(owner: &str, octet: u8) -> Record {
    Record::from_rdata(name(owner), 300, RData::A(A::new(10, 0, 0, octet)))
}

pub fn txt(owner: &str, text: &str) -> Record {
    Record::from_rdata(
        name(owner),
        300,
        RData::TXT(TXT::new(vec![text.to_owned()])),
    )
}

/// Answer a single transfer request with the given messages, then hang up
pub async fn serve(messages: Vec<Vec<Record>>, code: ResponseCode) -> SocketAddr {
    respond(move |query| {
        messages
            .into_iter()
            .map(|answers| {
                let mut response = Message::new();
                response
                    .set_id(query.id())
                    .set_message_type(MessageType::Response)
                    .set_response_code(code)
                    .add_answers(answers);
                response
            })
            .collect()
    })
    .await
}

/// Answer a single transfer request with whatever `reply` builds from the query
pub async fn respond<F>(reply: F) -> SocketAddr
where
    F: FnOnce(Message) -> Vec<Message> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let query = read_query(&mut socket).await;

        for response in reply(query) {
            let encoded = response.to_vec().unwrap();
            socket.write_u16(encoded.len() as u16).await.unwrap();
            socket.write_all(&encoded).await.unwrap();
        }
    });

    address
}

/// Accept the transfer request and never answer it
pub async fn silent() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        read_query(&mut socket).await;
        sleep(Duration::from_secs(30)).await;
        drop(socket);
    });

    address
}

async fn read_query(socket: &mut TcpStream) -> Message {
    let length = socket.read_u16().await.unwrap();
    let mut buffer = vec![0; usize::from(length)];
    socket.read_exact(&mut buffer).await.unwrap();
    Message::from_vec(&buffer).unwrap()
}
