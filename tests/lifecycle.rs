// Copyright 2026 BadCompany
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Integration tests for DIE, RESTART and KILL

mod common;

use common::Builder;
use opsgate::engine_core::events::ControlEvent;
use std::time::Duration;

#[tokio::test]
async fn test_die_exits_with_status_zero_and_no_reply() {
    let h = Builder::new().build().await;
    let alice = h.connect_operator("alice").await;

    h.run(&alice, "DIE").await;

    assert_eq!(h.journal.entries(), vec!["exit 0"]);
}

#[tokio::test]
async fn test_restart_closes_connections_before_exec() {
    let h = Builder::new().build().await;
    let alice = h.connect_operator("alice").await;

    h.run(&alice, "RESTART").await;

    assert_eq!(
        h.journal.entries(),
        vec!["close_all", "restart /usr/local/bin/opsgate"]
    );
}

#[tokio::test]
async fn test_restart_proceeds_when_close_all_fails() {
    let h = Builder::new().failing_close_all().build().await;
    let alice = h.connect_operator("alice").await;

    h.run(&alice, "RESTART").await;

    assert_eq!(
        h.journal.entries(),
        vec!["close_all", "restart /usr/local/bin/opsgate"]
    );
}

#[tokio::test]
async fn test_kill_unknown_nick() {
    let h = Builder::new().build().await;
    let alice = h.connect_operator("alice").await;

    h.run(&alice, "KILL nobody :bye").await;

    assert_eq!(
        h.sent_to(&alice),
        vec![":irc.test 401 alice nobody :No such nick/channel"]
    );
    assert!(h.connections.closed().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_kill_sends_error_before_delayed_close() {
    let mut h = Builder::new().build().await;
    let alice = h.connect_operator("alice").await;
    let bob = h.connect("bob", "bobby", "pool-7.example.net").await;

    let handle = h
        .dispatcher
        .kill(&alice, "BOB", None)
        .await
        .unwrap()
        .expect("bob is connected");

    assert_eq!(
        h.sent_to(&bob),
        vec!["ERROR :Closing Link: pool-7.example.net (Killed by alice: bob)"]
    );
    // The killer gets nothing back
    assert!(h.sent_to(&alice).is_empty());

    match h.events.try_recv().unwrap() {
        ControlEvent::Quit {
            connection,
            source,
            reason,
            disconnect,
        } => {
            assert_eq!(connection, bob.connection);
            assert_eq!(source, "bob!bobby@pool-7.example.net");
            assert_eq!(reason, "Killed by alice: bob");
            assert!(!disconnect);
        }
        other => panic!("unexpected event {:?}", other),
    }

    tokio::time::advance(Duration::from_millis(999)).await;
    assert!(h.connections.closed().is_empty());

    tokio::time::advance(Duration::from_millis(1)).await;
    handle.await.unwrap();
    assert_eq!(h.connections.closed(), vec![bob.connection]);

    let error_at = h.journal.position(&format!(
        "send {}",
        "ERROR :Closing Link: pool-7.example.net (Killed by alice: bob)"
    ));
    let close_at = h.journal.position(&format!("close {}", bob.connection));
    assert!(error_at < close_at);
}

#[tokio::test(start_paused = true)]
async fn test_kill_with_reason_through_the_wire() {
    let h = Builder::new()
        .settings(|c| c.kill_close_delay_ms = 250)
        .build()
        .await;
    let alice = h.connect_operator("alice").await;
    let bob = h.connect("bob", "bobby", "pool-7.example.net").await;

    h.run(&alice, "KILL bob :flooding the channel").await;

    assert_eq!(
        h.sent_to(&bob),
        vec!["ERROR :Closing Link: pool-7.example.net (Killed by alice: flooding the channel)"]
    );

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(h.connections.closed(), vec![bob.connection]);
}

#[tokio::test]
async fn test_kill_rechecks_operator_status() {
    let h = Builder::new().build().await;
    let bob = h.connect("bob", "bob", "home.example.org").await;
    let carol = h.connect("carol", "carol", "home.example.org").await;

    let handle = h.dispatcher.kill(&bob, "carol", None).await.unwrap();

    assert!(handle.is_none());
    assert!(h.sent_to(&carol).is_empty());
    assert_eq!(
        h.sent_to(&bob),
        vec![":irc.test 481 bob :Permission Denied- You're not an IRC operator"]
    );
}
