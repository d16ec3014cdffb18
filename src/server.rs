use crate::data::{SchedulingOutput, SchedulingTableInfo, SolveError};
use crate::solver;
use axum::http::StatusCode;
use axum::{Json, Router, routing::post};

async fn solve_handler(
    Json(input): Json<SchedulingTableInfo>,
) -> Result<Json<SchedulingOutput>, (StatusCode, String)> {
    // rank semantics belong to this layer, not the core: the client
    // contract says rankings start at 1
    if let Some((i, j)) = first_invalid_ranking(&input) {
        return Err((
            StatusCode::BAD_REQUEST,
            format!(
                "ranking for candidate {} at time slot {} must be at least 1",
                i, j
            ),
        ));
    }

    match solver::solve(&input) {
        Ok(output) => Ok(Json(output)),
        Err(e @ (SolveError::ShapeMismatch(_) | SolveError::InfeasibleCapacity(_))) => {
            Err((StatusCode::BAD_REQUEST, e.to_string()))
        }
        Err(e) => Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string())),
    }
}

fn first_invalid_ranking(input: &SchedulingTableInfo) -> Option<(usize, usize)> {
    input
        .candidates_time_slot_rankings
        .iter()
        .enumerate()
        .find_map(|(i, row)| row.iter().position(|&rank| rank < 1).map(|j| (i, j)))
}

pub async fn run_server() {
    let app = Router::new().route("/v1/assignment/solve", post(solve_handler));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:8080")
        .await
        .unwrap();

    println!("Server running at http://{}", listener.local_addr().unwrap());

    axum::serve(listener, app).await.unwrap();
}
