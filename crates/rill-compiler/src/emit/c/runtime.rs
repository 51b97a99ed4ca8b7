//! Fixed parts of the generated C runtime.
//!
//! Written with the default `rill_`/`RILL_` prefix; [`expand`] swaps in the
//! configured one. Location support is switched with `RILL_LOCATIONS` so
//! the text stays the same for every grammar.

use crate::config::{Config, DEFAULT_PREFIX};

/// Applies the configured prefix to a template.
pub(super) fn expand(template: &str, config: &Config) -> String {
    let lower = DEFAULT_PREFIX;
    let upper = DEFAULT_PREFIX.to_uppercase();
    if config.prefix == lower {
        return template.to_string();
    }
    template
        .replace(lower, &config.prefix)
        .replace(&upper, &config.upper_prefix())
}

pub(super) const STATUS: &str = r#"#define RILL_OK 0
#define RILL_DONE 1
#define RILL_SYNTAX_ERROR 2
#define RILL_SEMANTIC_ERROR 3
#define RILL_STACK_OVERFLOW 4
#define RILL_CONTINUE (-1)
"#;

pub(super) const STRUCTS: &str = r#"typedef struct {
    unsigned char bits[RILL_MASK_BYTES];
} rill_mask;

typedef struct {
    rill_semval val;
#if RILL_LOCATIONS
    rill_loc loc;
#endif
    unsigned char live;
} rill_slot;

typedef struct {
    unsigned short fn;
    unsigned short state;
    /* first slot of the frame's window on the semval stack */
    size_t prev_index;
    rill_mask follow;
    unsigned counters[RILL_MAX_COUNTERS];
#if RILL_LOCATIONS
    rill_loc first;
    rill_loc last;
    unsigned char consumed;
#endif
} rill_frame;

typedef struct {
    unsigned short recovery;
    size_t frame;
} rill_marker;

typedef struct rill_parser {
    rill_frame *frames;
    rill_marker *markers;
    rill_slot *slots;
    size_t frame_cap;
    size_t slot_cap;
    size_t depth;
    size_t marker_len;
    size_t top;
    int status;
    unsigned char started;
    unsigned char has_la;
    unsigned char has_ret;
    unsigned char has_result;
    rill_token_kind la_kind;
    rill_semval la_sem;
    rill_semval ret;
    short ret_type;
    rill_semval result;
    short result_type;
#if RILL_LOCATIONS
    rill_loc la_loc;
    rill_loc ret_loc;
    rill_loc result_loc;
    rill_loc last_loc;
    unsigned char has_last;
#endif
    /* owned by the caller */
    void *user;
} rill_parser;

/* Declares a parser with room for `depth` frames and `semval_depth`
   values. Call rill_parser_init before the first token. */
#define RILL_PARSER_DECLARE(name, depth, semval_depth) \
    rill_frame name##_frames[(depth)]; \
    rill_marker name##_markers[(depth)]; \
    rill_slot name##_slots[(semval_depth)]; \
    rill_parser name = { name##_frames, name##_markers, name##_slots, (depth), (semval_depth) }

void rill_parser_init(rill_parser *p);
void rill_parser_reset(rill_parser *p);
int rill_result(rill_parser *p, rill_semval *out);
#if RILL_LOCATIONS
rill_loc rill_result_loc(const rill_parser *p);
#endif
const char *rill_token_name(int kind);
int rill_snprint_mask(char *buf, size_t len, const rill_mask *mask, const char *sep);
"#;

pub(super) const DEFAULT_ERROR: &str = r#"#if RILL_LOCATIONS
static void rill_default_error(rill_parser *p, rill_token_kind kind, rill_semval sem,
                               const rill_mask *expected, rill_loc loc)
#else
static void rill_default_error(rill_parser *p, rill_token_kind kind, rill_semval sem,
                               const rill_mask *expected)
#endif
{
    char buf[256];

    (void)p;
    (void)sem;
#if RILL_LOCATIONS
    (void)loc;
#endif
    rill_snprint_mask(buf, sizeof buf, expected, ", ");
    fprintf(stderr, "syntax error: unexpected %s, expected %s\n", rill_token_name(kind), buf);
}
"#;

pub(super) const HELPERS: &str = r#"static int rill_mask_has(const rill_mask *m, int kind)
{
    return (m->bits[kind >> 3] >> (kind & 7)) & 1;
}

static void rill_mask_or(rill_mask *dst, const rill_mask *src)
{
    size_t i;

    for (i = 0; i < RILL_MASK_BYTES; i++)
        dst->bits[i] |= src->bits[i];
}

const char *rill_token_name(int kind)
{
    if (kind < 0 || kind >= RILL_TOKEN_COUNT)
        return "<unknown>";
    return rill_token_names[kind];
}

int rill_snprint_mask(char *buf, size_t len, const rill_mask *mask, const char *sep)
{
    size_t used = 0;
    const char *lead = "";
    int kind;

    if (len > 0)
        buf[0] = '\0';
    for (kind = 0; kind < RILL_TOKEN_COUNT; kind++) {
        int n;

        if (!rill_mask_has(mask, kind))
            continue;
        n = snprintf(used < len ? buf + used : NULL, used < len ? len - used : 0,
                     "%s%s", lead, rill_token_names[kind]);
        if (n < 0)
            return n;
        used += (size_t)n;
        lead = sep;
    }
    return (int)used;
}

static void rill_release(rill_slot *slot, short type)
{
    if (slot->live) {
        rill_destroy(type, &slot->val);
        slot->live = 0;
    }
}

static void rill_store(rill_slot *slot, short type, rill_semval val)
{
    rill_release(slot, type);
    slot->val = val;
    slot->live = 1;
}

static void rill_release_lookahead(rill_parser *p)
{
    if (p->has_la) {
        rill_destroy(rill_token_types[p->la_kind], &p->la_sem);
        p->has_la = 0;
    }
}

/* Releases the frame's live slots, last first, and pops its window. */
static void rill_release_frame(rill_parser *p, rill_frame *f)
{
    size_t i = rill_slot_counts[f->fn];

    while (i > 0) {
        i--;
        rill_release(&p->slots[f->prev_index + i], rill_slot_types[f->fn][i]);
    }
    p->top = f->prev_index;
}

/* Unwinds every frame and leaves the parser in `status`. */
static int rill_halt(rill_parser *p, int status)
{
    while (p->depth > 0) {
        rill_release_frame(p, &p->frames[p->depth - 1]);
        p->depth--;
    }
    if (p->has_ret) {
        rill_destroy(p->ret_type, &p->ret);
        p->has_ret = 0;
    }
    p->marker_len = 0;
    rill_release_lookahead(p);
    p->status = status;
    return status;
}

static int rill_push(rill_parser *p, unsigned short fn, const rill_mask *follow)
{
    size_t n = rill_slot_counts[fn];
    rill_frame *f;
    size_t i;

    if (p->depth == p->frame_cap || p->slot_cap - p->top < n)
        return rill_halt(p, RILL_STACK_OVERFLOW);
    f = &p->frames[p->depth++];
    f->fn = fn;
    f->state = 0;
    f->prev_index = p->top;
    if (follow)
        f->follow = *follow;
    else
        memset(&f->follow, 0, sizeof f->follow);
    memset(f->counters, 0, sizeof f->counters);
#if RILL_LOCATIONS
    f->consumed = 0;
#endif
    for (i = 0; i < n; i++)
        p->slots[p->top + i].live = 0;
    p->top += n;
    return RILL_CONTINUE;
}

/* The callee inherits the caller's follow set. */
static int rill_call(rill_parser *p, unsigned short fn)
{
    rill_mask follow = p->frames[p->depth - 1].follow;

    return rill_push(p, fn, &follow);
}

#if RILL_LOCATIONS
static rill_loc rill_zero_loc(rill_parser *p)
{
    return RILL_ZERO_LOC_FN(p->has_last ? &p->last_loc : NULL);
}

static rill_loc rill_frame_loc(rill_parser *p, const rill_frame *f)
{
    if (f->consumed)
        return RILL_SPAN_FN(&f->first, &f->last);
    return rill_zero_loc(p);
}
#endif

/* Moves the lookahead into `slot`, or releases it when `slot` is negative. */
static void rill_consume(rill_parser *p, rill_frame *f, int slot)
{
    if (slot >= 0) {
        rill_slot *s = &p->slots[f->prev_index + slot];

        rill_store(s, rill_slot_types[f->fn][slot], p->la_sem);
#if RILL_LOCATIONS
        s->loc = p->la_loc;
#endif
    } else {
        rill_destroy(rill_token_types[p->la_kind], &p->la_sem);
    }
#if RILL_LOCATIONS
    if (!f->consumed) {
        f->first = p->la_loc;
        f->consumed = 1;
    }
    f->last = p->la_loc;
    p->last_loc = p->la_loc;
    p->has_last = 1;
#endif
    memset(&f->follow, 0, sizeof f->follow);
    p->has_la = 0;
}

static int rill_return(rill_parser *p)
{
    rill_frame *f = &p->frames[p->depth - 1];
    rill_slot *out = &p->slots[f->prev_index];
    unsigned char has = out->live;
    rill_semval val = out->val;
    short type = rill_fn_types[f->fn];
    rill_mask follow = f->follow;
#if RILL_LOCATIONS
    rill_loc loc = rill_frame_loc(p, f);
    rill_frame done = *f;
#endif

    out->live = 0;
    rill_release_frame(p, f);
    p->depth--;
    if (p->depth == 0) {
        p->result = val;
        p->has_result = has;
        p->result_type = type;
#if RILL_LOCATIONS
        p->result_loc = loc;
#endif
        rill_release_lookahead(p);
        p->status = RILL_DONE;
        return RILL_DONE;
    }
    f = &p->frames[p->depth - 1];
    f->follow = follow;
    p->ret = val;
    p->has_ret = has;
    p->ret_type = type;
#if RILL_LOCATIONS
    p->ret_loc = loc;
    if (done.consumed) {
        if (!f->consumed) {
            f->first = done.first;
            f->consumed = 1;
        }
        f->last = done.last;
    }
#endif
    return RILL_CONTINUE;
}

/* Stores the returned value in `slot`, or releases it when negative. */
static void rill_resume(rill_parser *p, rill_frame *f, int slot)
{
    if (slot >= 0) {
        rill_slot *s = &p->slots[f->prev_index + slot];

        if (p->has_ret)
            rill_store(s, rill_slot_types[f->fn][slot], p->ret);
#if RILL_LOCATIONS
        s->loc = p->ret_loc;
#endif
    } else if (p->has_ret) {
        rill_destroy(p->ret_type, &p->ret);
    }
    p->has_ret = 0;
}

static void rill_report(rill_parser *p, const rill_mask *expected)
{
#if RILL_LOCATIONS
    RILL_ERROR_FN(p, p->la_kind, p->la_sem, expected, p->la_loc);
#else
    RILL_ERROR_FN(p, p->la_kind, p->la_sem, expected);
#endif
}

#if RILL_RECOVERIES
/* Unwinds to the innermost marker and jumps to its handler. The offending
   token stays as lookahead. */
static int rill_recover(rill_parser *p)
{
    rill_marker m = p->markers[--p->marker_len];
    const rill_recovery *r = &rill_recoveries[m.recovery];
    rill_frame *f;
    unsigned i;

    while (p->depth - 1 > m.frame) {
        rill_release_frame(p, &p->frames[p->depth - 1]);
        p->depth--;
    }
    f = &p->frames[m.frame];
    for (i = r->scoped_len; i > 0; i--) {
        unsigned char slot = r->scoped[i - 1];

        rill_release(&p->slots[f->prev_index + slot], rill_slot_types[f->fn][slot]);
    }
    memset(&f->follow, 0, sizeof f->follow);
    f->state = r->handler;
    return RILL_CONTINUE;
}
#endif

/* Expected tokens are `accept` plus whatever could follow here. */
static int rill_syntax_error(rill_parser *p, const rill_mask *accept)
{
    rill_mask expected = *accept;

    rill_mask_or(&expected, &p->frames[p->depth - 1].follow);
    rill_report(p, &expected);
#if RILL_RECOVERIES
    if (p->marker_len > 0)
        return rill_recover(p);
#endif
    return rill_halt(p, RILL_SYNTAX_ERROR);
}

static int rill_enter_recovery(rill_parser *p, unsigned short recovery)
{
    if (p->marker_len == p->frame_cap)
        return rill_halt(p, RILL_STACK_OVERFLOW);
    p->markers[p->marker_len].recovery = recovery;
    p->markers[p->marker_len].frame = p->depth - 1;
    p->marker_len++;
    return RILL_CONTINUE;
}
"#;

pub(super) const API: &str = r#"void rill_parser_init(rill_parser *p)
{
    p->depth = 0;
    p->marker_len = 0;
    p->top = 0;
    p->status = RILL_OK;
    p->started = 0;
    p->has_la = 0;
    p->has_ret = 0;
    p->has_result = 0;
#if RILL_LOCATIONS
    p->has_last = 0;
#endif
}

/* Releases every value still owned by the parser, the unclaimed result
   included. */
void rill_parser_reset(rill_parser *p)
{
    rill_halt(p, RILL_OK);
    if (p->has_result)
        rill_destroy(p->result_type, &p->result);
    rill_parser_init(p);
}

/* Moves the root's value to `out`. Returns 0 when there is none. */
int rill_result(rill_parser *p, rill_semval *out)
{
    if (!p->has_result)
        return 0;
    *out = p->result;
    p->has_result = 0;
    return 1;
}

#if RILL_LOCATIONS
rill_loc rill_result_loc(const rill_parser *p)
{
    return p->result_loc;
}
#endif

/* Takes ownership of `sem`, except for a kind outside the token enum: that
   is refused with SYNTAX_ERROR, the parser is left as it was and `sem`
   stays with the caller. */
#if RILL_LOCATIONS
static int rill_feed(rill_parser *p, unsigned short root, int kind, rill_semval sem, rill_loc loc)
#else
static int rill_feed(rill_parser *p, unsigned short root, int kind, rill_semval sem)
#endif
{
    int status;

    if (kind < 0 || kind >= RILL_TOKEN_COUNT)
        return RILL_SYNTAX_ERROR;
    if (p->status != RILL_OK) {
        rill_destroy(rill_token_types[kind], &sem);
        return p->status;
    }
    if (!p->started) {
        p->started = 1;
        status = rill_push(p, root, NULL);
        if (status != RILL_CONTINUE) {
            rill_destroy(rill_token_types[kind], &sem);
            return status;
        }
    }
    p->la_kind = (rill_token_kind)kind;
    p->la_sem = sem;
#if RILL_LOCATIONS
    p->la_loc = loc;
#endif
    p->has_la = 1;
    return rill_run(p);
}
"#;
