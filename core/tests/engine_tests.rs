use cinematch_core::catalog::read_movies;
use cinematch_core::similarity::similarity_scores;
use cinematch_core::{EngineError, MovieIndex, VectorizerConfig};

const HEADER: &str = "title,genres,keywords,overview,vote_average,vote_count,poster_path\n";

fn index_from(rows: &str) -> MovieIndex {
    let csv = format!("{HEADER}{rows}");
    MovieIndex::build(read_movies(csv.as_bytes()).unwrap(), VectorizerConfig::default())
}

fn sample_index() -> MovieIndex {
    index_from(
        "Space Raiders,Science Fiction,space pirates,A crew of pirates raids a space station,7.1,900,/sr.jpg\n\
         Star Raiders II,Science Fiction,space pirates sequel,The pirates return to raid another space station,6.2,300,/sr2.jpg\n\
         Harbor Lights,Romance,love letters,Two strangers fall in love through letters,7.4,450,\n\
         Dusk Heist,Crime,heist vault,A crew plans a vault heist at dusk,6.9,1200,/dh.jpg\n\
         Love in Orbit,Romance Science Fiction,space love,Astronauts fall in love aboard a station,5.8,80,/lo.jpg\n",
    )
}

#[test]
fn near_identical_movies_rank_first() {
    let index = index_from(
        "A,Action,hero,hero fights,7.0,10,\n\
         B,Action,hero,hero fights,6.0,20,\n\
         C,Romance,love,love story,8.0,30,\n",
    );
    let a = index.resolve("A").unwrap();
    let top = index.rank(a, 1);
    assert_eq!(top.len(), 1);
    assert_eq!(index.catalog().get(top[0].row).unwrap().title, "B");
}

#[test]
fn rank_never_contains_the_query_row() {
    let index = sample_index();
    for row in 0..index.catalog().len() {
        for n in [0, 1, 3, 10] {
            assert!(index.rank(row, n).iter().all(|nb| nb.row != row));
        }
    }
}

#[test]
fn rank_scores_are_non_increasing_and_match_cosine() {
    let index = sample_index();
    for row in 0..index.catalog().len() {
        let ranked = index.rank(row, 10);
        let scores = similarity_scores(index.matrix(), row).unwrap();
        for pair in ranked.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
        for nb in &ranked {
            assert_eq!(nb.score, scores[nb.row]);
            assert!((0.0..=1.0).contains(&nb.score));
        }
    }
}

#[test]
fn oversized_n_returns_every_other_row() {
    let index = sample_index();
    let ranked = index.rank(2, 1000);
    assert_eq!(ranked.len(), index.catalog().len() - 1);
    let mut rows: Vec<usize> = ranked.iter().map(|nb| nb.row).collect();
    rows.sort_unstable();
    assert_eq!(rows, vec![0, 1, 3, 4]);
}

#[test]
fn rank_is_idempotent() {
    let index = sample_index();
    assert_eq!(index.rank(0, 4), index.rank(0, 4));
}

#[test]
fn equal_scores_keep_catalog_order() {
    let index = index_from(
        "Q,Western,cowboy,cowboy duel,7.0,10,\n\
         X,Opera,aria,soprano sings,7.0,10,\n\
         Y,Ballet,tutu,dancer spins,7.0,10,\n",
    );
    let rows: Vec<usize> = index.rank(0, 2).iter().map(|nb| nb.row).collect();
    assert_eq!(rows, vec![1, 2]);
}

#[test]
fn exact_title_resolves_deterministically() {
    let index = sample_index();
    for _ in 0..3 {
        assert_eq!(index.resolve("Harbor Lights").unwrap(), 2);
    }
}

#[test]
fn unique_substring_resolves_case_insensitively() {
    let index = sample_index();
    assert_eq!(index.resolve("heist").unwrap(), 3);
    assert_eq!(index.resolve("ORBIT").unwrap(), 4);
}

#[test]
fn substring_resolution_takes_first_catalog_match() {
    let index = sample_index();
    assert_eq!(index.resolve("raiders").unwrap(), 0);
}

#[test]
fn unmatched_title_is_not_found_and_recommends_nothing() {
    let index = sample_index();
    assert!(matches!(index.resolve("Nonexistent"), Err(EngineError::NotFound(_))));
    assert!(matches!(index.resolve("   "), Err(EngineError::NotFound(_))));
    assert!(index.recommend("Nonexistent", 5).is_empty());
}

#[test]
fn recommend_composes_resolve_and_rank() {
    let index = sample_index();
    let recs = index.recommend("Space Raiders", 2);
    assert_eq!(recs.len(), 2);
    assert_eq!(recs[0].title, "Star Raiders II");
    assert!(recs.iter().all(|r| r.title != "Space Raiders"));
}

#[test]
fn singleton_catalog_has_nothing_to_rank() {
    let index = index_from("Solo,Drama,alone,lonely walk,5.0,1,\n");
    assert!(matches!(index.try_recommend("Solo", 5), Err(EngineError::EmptyResult)));
    assert!(index.recommend("Solo", 5).is_empty());
}

#[test]
fn duplicate_titles_prefer_most_voted() {
    let index = index_from(
        "Twin,Drama,first,first overview,6.0,10,\n\
         Twin,Drama,second,second overview,6.0,99,\n\
         Twin,Drama,third,third overview,6.0,99,\n",
    );
    assert_eq!(index.resolve("Twin").unwrap(), 1);
}

#[test]
fn search_orders_matches_by_votes() {
    let index = index_from(
        "Batman,Action,bat,dark knight,7.0,100,\n\
         The Bat Signal,Action,signal,light in the sky,6.0,500,\n\
         Cats,Musical,cats,singing cats,4.0,1000,\n",
    );
    let titles: Vec<&str> = index.search("bat", 5).iter().map(|r| r.title.as_str()).collect();
    assert_eq!(titles, vec!["The Bat Signal", "Batman"]);
}

#[test]
fn suggestions_keep_catalog_order() {
    let index = index_from(
        "Batman,Action,bat,dark knight,7.0,100,\n\
         The Bat Signal,Action,signal,light in the sky,6.0,500,\n\
         Bat Out of Hell,Horror,bat,a bat escapes,5.0,900,\n",
    );
    let titles: Vec<&str> = index.suggest("bat", 2).iter().map(|r| r.title.as_str()).collect();
    assert_eq!(titles, vec!["Batman", "The Bat Signal"]);
    assert!(index.suggest("b", 5).is_empty());
}

#[test]
fn unparseable_votes_sort_last() {
    let index = index_from(
        "Batman,Action,bat,dark knight,7.0,100,\n\
         Bat Mystery,Mystery,bat,who is the bat,NaN,NaN,\n\
         The Bat Signal,Action,signal,light in the sky,6.0,500,\n",
    );
    let titles: Vec<&str> = index.search("bat", 5).iter().map(|r| r.title.as_str()).collect();
    assert_eq!(titles, vec!["The Bat Signal", "Batman", "Bat Mystery"]);
    let top: Vec<&str> = index.list_top(None, 1).iter().map(|r| r.title.as_str()).collect();
    assert_eq!(top, vec!["The Bat Signal"]);
}

#[test]
fn short_or_empty_queries_find_nothing() {
    let index = sample_index();
    assert!(index.search("", 5).is_empty());
    assert!(index.search("s", 5).is_empty());
    assert_eq!(index.search("ra", 1).len(), 1);
}

#[test]
fn list_top_filters_by_genre() {
    let index = sample_index();
    let all: Vec<&str> = index.list_top(None, 2).iter().map(|r| r.title.as_str()).collect();
    assert_eq!(all, vec!["Dusk Heist", "Space Raiders"]);
    let romance: Vec<&str> = index.list_top(Some("romance"), 10).iter().map(|r| r.title.as_str()).collect();
    assert_eq!(romance, vec!["Harbor Lights", "Love in Orbit"]);
}

#[test]
fn genres_are_split_and_deduplicated() {
    let index = index_from(
        "A,\"Action, Drama\",k,o,1,1,\n\
         B,\"Drama,Comedy\",k,o,1,1,\n",
    );
    assert_eq!(index.genres(), vec!["Action", "Comedy", "Drama"]);
}
