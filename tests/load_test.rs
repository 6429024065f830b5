//! Load testing for the reverse proxy.

use futures_util::future::join_all;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

mod common;

#[tokio::test]
async fn test_load_exceeding_worker_count() {
    // 1. Setup slow echo backends
    let mut backends = Vec::new();
    for _ in 0..2 {
        backends.push(
            common::start_programmable_backend(|request| async move {
                tokio::time::sleep(Duration::from_millis(5)).await;
                common::http_response("200 OK", &[], &request.target)
            })
            .await,
        );
    }

    // 2. Start proxy with far fewer workers than concurrent callers
    let workers = 4;
    let (proxy, shutdown) = common::start_proxy(common::proxy_config(&backends, workers)).await;

    // 3. Run Load Test
    let concurrency = 20;
    let requests_per_task = 25;
    let total_requests = concurrency * requests_per_task;

    let client = common::client();
    let start = Instant::now();

    let tasks = (0..concurrency).map(|task| {
        let client = client.clone();
        tokio::spawn(async move {
            let mut latencies = Vec::new();
            for i in 0..requests_per_task {
                let path = format!("/task/{}/req/{}", task, i);
                let req_start = Instant::now();
                let res = client
                    .get(format!("http://{}{}", proxy, path))
                    .send()
                    .await
                    .expect("request failed");
                assert!(res.status().is_success());
                // every caller must get its own response back
                assert_eq!(res.text().await.unwrap(), path);
                latencies.push(req_start.elapsed());
            }
            latencies
        })
    });

    let mut all_latencies = Vec::new();
    for latencies in join_all(tasks).await {
        all_latencies.extend(latencies.unwrap());
    }

    let duration = start.elapsed();
    assert_eq!(all_latencies.len(), total_requests);

    all_latencies.sort();
    let p50 = all_latencies[all_latencies.len() / 2];
    let p99 = all_latencies[(all_latencies.len() as f64 * 0.99) as usize];

    println!("\n--- Load Test Results ---");
    println!("Total Requests: {}", total_requests);
    println!("Concurrency:    {}", concurrency);
    println!("Workers:        {}", workers);
    println!("Total Duration: {:?}", duration);
    println!("Requests/sec:   {:.2}", total_requests as f64 / duration.as_secs_f64());
    println!("P50 Latency:    {:?}", p50);
    println!("P99 Latency:    {:?}", p99);
    println!("-------------------------\n");

    shutdown.trigger();
}

#[tokio::test]
async fn test_upstream_concurrency_bounded_by_workers() {
    let in_flight = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));

    let backend = {
        let in_flight = in_flight.clone();
        let peak = peak.clone();
        common::start_programmable_backend(move |_| {
            let in_flight = in_flight.clone();
            let peak = peak.clone();
            async move {
                let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(50)).await;
                in_flight.fetch_sub(1, Ordering::SeqCst);
                common::http_response("200 OK", &[], "held")
            }
        })
        .await
    };

    let workers = 4;
    let (proxy, shutdown) = common::start_proxy(common::proxy_config(&[backend], workers)).await;

    let client = common::client();
    let callers = (0..workers * 5).map(|_| {
        let client = client.clone();
        tokio::spawn(async move {
            let res = client.get(format!("http://{}/", proxy)).send().await.unwrap();
            assert!(res.status().is_success());
            res.text().await.unwrap()
        })
    });
    for body in join_all(callers).await {
        assert_eq!(body.unwrap(), "held");
    }

    let peak = peak.load(Ordering::SeqCst);
    assert!(peak <= workers, "{} concurrent upstream calls with {} workers", peak, workers);
    assert_eq!(peak, workers, "the pool never ran at full width");

    shutdown.trigger();
}
