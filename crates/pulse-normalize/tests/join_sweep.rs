//! Join sweep over a company directory holding enriched files from every
//! platform.

use std::path::Path;

use pulse_core::{COMMENT_FIELDS, POST_FIELDS};
use pulse_normalize::{join, join_all, NormalizeError, COMMENTS_FILE, POSTS_FILE};

const ENRICH: &str = "sentiment_pos,sentiment_neg,keyword,keyword_weight";

fn put(root: &Path, platform: &str, name: &str, header: &str, rows: &[&str]) {
    let dir = root.join(platform);
    std::fs::create_dir_all(&dir).expect("failed to create platform dir");
    let mut body = format!("{header},{ENRICH}\n");
    for row in rows {
        body.push_str(row);
        body.push('\n');
    }
    std::fs::write(dir.join(name), body).expect("failed to write fixture");
}

fn seed(root: &Path) {
    put(
        root,
        "Facebook",
        "acme_facebook_post_nlp.csv",
        "status_id,status_message,link_name,status_type,status_link,status_published,\
num_reactions,num_comments,num_shares,num_likes,num_loves,num_wows,num_hahas,num_sads,\
num_angrys,num_special",
        &["p1,hello,,status,,2018-01-01 08:00:00,5,1,2,3,1,0,0,0,0,1,0.9,0.1,tea,0.5"],
    );
    put(
        root,
        "Facebook",
        "acme_facebook_comment_nlp.csv",
        "comment_id,status_id,parent_id,comment_message,comment_author,comment_published,\
num_reactions,num_likes,num_loves,num_wows,num_hahas,num_sads,num_angrys,num_special",
        &["c1,p1,,nice,Fan,2018-01-01 09:00:00,2,2,0,0,0,0,0,0,0.8,0.2,,0"],
    );
    put(
        root,
        "Twitter",
        "acme_twitter_tweet_nlp.csv",
        "created_at,id,text,entities,retweet_count,reply_count,like_count",
        &[r#"2018-01-02 10:00:00,t1,hi,"{""urls"":[{""expanded_url"":""https://acme.test/a""}]}",4,0,7,0.7,0.3,hi,1"#],
    );
    put(
        root,
        "LinkedIn",
        "acme_linkedin_post_nlp.csv",
        "status_id,status_message,status_published,num_comments,num_likes",
        &["l1,launch,2017-07-14 10:41:00,1,9,0.6,0.4,launch,1"],
    );
    put(
        root,
        "LinkedIn",
        "acme_linkedin_comment_nlp.csv",
        "comment_id,status_id,comment_message,comment_published",
        &["lc1,l1,congrats,2017-07-14 11:00:00,0.9,0.1,,0"],
    );
    put(
        root,
        "Instagram",
        "acme_instagram_post_nlp.csv",
        "status_id,status_published,status_type,status_link,status_message,num_likes,num_comments",
        &["i1,2018-02-01 12:00:00,IMAGE,https://ig.test/p/i1,tea time,12,1,0.5,0.5,tea,0.9"],
    );
    put(
        root,
        "Instagram",
        "acme_instagram_comment_nlp.csv",
        "comment_id,status_id,parent_id,comment_published,comment_message,comment_author,num_likes",
        &["ic1,i1,,2018-02-01 13:00:00,yum,fan1,2,0.9,0.1,yum,1"],
    );
    put(
        root,
        "Weibo",
        "acme_weibo_tweet_nlp.csv",
        "created_at,status_id,text,is_paid,num_reposts,num_comments,num_likes",
        &["2018-01-02 00:00:00,w1,ni hao,false,1,2,3,0.6,0.4,,0"],
    );
}

fn lines(path: &Path) -> Vec<String> {
    std::fs::read_to_string(path)
        .expect("failed to read output")
        .lines()
        .map(str::to_owned)
        .collect()
}

// ---------------------------------------------------------------------------
// Full sweep
// ---------------------------------------------------------------------------

#[test]
fn sweep_joins_every_platform_into_fixed_width_outputs() {
    let dir = tempfile::tempdir().expect("failed to create tempdir");
    seed(dir.path());

    let summary = join(dir.path(), "acme").expect("join failed");
    // Facebook post unpivots to 7 rows; Twitter, LinkedIn, Instagram, Weibo add 1 each.
    assert_eq!(summary.posts, 11);
    // Facebook comment unpivots to 7 rows; LinkedIn and Instagram add 1 each.
    assert_eq!(summary.comments, 9);
    assert_eq!(summary.files, 8);
    assert_eq!(summary.skipped_files, 0);

    let posts = lines(&dir.path().join(POSTS_FILE));
    assert_eq!(posts[0], POST_FIELDS.join(","));
    assert_eq!(posts.len(), 12);
    for line in &posts[1..] {
        let record = csv::ReaderBuilder::new()
            .has_headers(false)
            .from_reader(line.as_bytes())
            .records()
            .next()
            .expect("row present")
            .expect("valid row");
        assert_eq!(record.len(), POST_FIELDS.len(), "row: {line}");
    }
    assert!(posts.contains(
        &"Facebook,acme,p1,hello,,status,,2018-01-01 08:00:00,5,1,2,likes,3,0.9,0.1,tea,0.5".to_owned()
    ));
    assert!(posts.contains(
        &"Twitter,acme,t1,hi,,,https://acme.test/a,2018-01-02 10:00:00,7,0,4,likes,7,0.7,0.3,hi,1".to_owned()
    ));
    assert!(posts.contains(
        &"Weibo,acme,w1,ni hao,,,,2018-01-02 00:00:00,3,2,1,likes,3,0.6,0.4,,0".to_owned()
    ));

    let comments = lines(&dir.path().join(COMMENTS_FILE));
    assert_eq!(comments[0], COMMENT_FIELDS.join(","));
    assert!(comments.contains(
        &"LinkedIn,acme,lc1,l1,,congrats,,2017-07-14 11:00:00,,,,0.9,0.1,,0".to_owned()
    ));
    assert!(comments.contains(
        &"Instagram,acme,ic1,i1,,yum,fan1,2018-02-01 13:00:00,2,likes,2,0.9,0.1,yum,1".to_owned()
    ));
}

#[test]
fn rerun_overwrites_instead_of_appending() {
    let dir = tempfile::tempdir().expect("failed to create tempdir");
    seed(dir.path());

    join_all(dir.path(), "acme", 2).expect("first join failed");
    let first = std::fs::read_to_string(dir.path().join(POSTS_FILE)).expect("read posts");
    join_all(dir.path(), "acme", 2).expect("second join failed");
    let second = std::fs::read_to_string(dir.path().join(POSTS_FILE)).expect("read posts");

    assert_eq!(first, second);
}

#[test]
fn unenriched_and_profile_files_are_ignored() {
    let dir = tempfile::tempdir().expect("failed to create tempdir");
    seed(dir.path());
    let weibo = dir.path().join("Weibo");
    std::fs::write(weibo.join("acme_weibo_tweet.csv"), "created_at,status_id\n").expect("write");
    std::fs::write(weibo.join("acme_weibo_profile.csv"), "id\n1\n").expect("write");

    let summary = join(dir.path(), "acme").expect("join failed");
    assert_eq!(summary.files, 8);
}

// ---------------------------------------------------------------------------
// Failures
// ---------------------------------------------------------------------------

#[test]
fn renamed_source_column_stops_the_sweep() {
    let dir = tempfile::tempdir().expect("failed to create tempdir");
    put(
        dir.path(),
        "Twitter",
        "acme_twitter_tweet_nlp.csv",
        "created_at,tweet_id,text,entities,retweet_count,reply_count,like_count",
        &["2018-01-02 10:00:00,t1,hi,{},4,0,7,0.7,0.3,hi,1"],
    );

    let err = join(dir.path(), "acme").expect_err("join should fail");
    assert!(matches!(
        err,
        NormalizeError::MissingSourceColumn { column, .. } if column == "id"
    ));
}
