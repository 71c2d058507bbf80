table! {
    users (id) {
        id -> Int4,
        email -> Varchar,
        joined -> Timestamptz,
        last_login -> Nullable<Timestamptz>,
    }
}

table! {
    subjects (id) {
        id -> Int4,
        user_id -> Int4,
        name -> Varchar,
        color -> Varchar,
        icon -> Varchar,
        created_at -> Timestamptz,
    }
}

table! {
    questions (id) {
        id -> Int4,
        user_id -> Int4,
        subject_id -> Int4,
        title -> Varchar,
        text -> Text,
        answer -> Text,
        notes -> Text,
        difficulty -> Varchar,
        status -> Varchar,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
        repetitions -> Int4,
        interval_days -> Int4,
        ease -> Float4,
        next_review -> Timestamptz,
        last_reviewed -> Nullable<Timestamptz>,
    }
}

table! {
    question_images (id) {
        id -> Int4,
        user_id -> Int4,
        question_id -> Nullable<Int4>,
        url -> Varchar,
        created_at -> Timestamptz,
    }
}

table! {
    review_logs (id) {
        id -> Int4,
        user_id -> Int4,
        question_id -> Int4,
        rating -> Varchar,
        reviewed_at -> Timestamptz,
    }
}

joinable!(subjects -> users (user_id));
joinable!(questions -> users (user_id));
joinable!(questions -> subjects (subject_id));
joinable!(question_images -> users (user_id));
joinable!(question_images -> questions (question_id));
joinable!(review_logs -> users (user_id));
joinable!(review_logs -> questions (question_id));

allow_tables_to_appear_in_same_query!(
    users,
    subjects,
    questions,
    question_images,
    review_logs,
);
