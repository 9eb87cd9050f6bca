use super::{Post, PostBlock, PostSection};
use time::macros::date;

pub static POSTS: [Post; 5] = [
    Post {
        slug: "contract-creation",
        title: "CREATE, CREATE2, CREATE3",
        description: "Three ways to put a contract on chain, and what actually determines the address it lands on.",
        published: true,
        date: date!(2022 - 11 - 28),
        author: "Marco Ferrante",
        url: None,
        repository: Some("https://github.com/mferrante/create3-factory"),
        sections: &[
            PostSection {
                id: "create",
                title: "CREATE",
                blocks: &[
                    PostBlock::Paragraph(
                        "The original deployment opcode derives the new address from the sender and the sender's nonce. That makes addresses sequential and fragile: redeploying the same bytecode after an unrelated transaction lands somewhere else entirely.",
                    ),
                    PostBlock::Code {
                        language: "solidity",
                        code: "address predicted = address(uint160(uint256(keccak256(\n    abi.encodePacked(bytes1(0xd6), bytes1(0x94), deployer, nonce)\n))));",
                    },
                ],
            },
            PostSection {
                id: "create2",
                title: "CREATE2",
                blocks: &[
                    PostBlock::Paragraph(
                        "CREATE2 swaps the nonce for a caller-chosen salt and a hash of the init code. The address becomes a pure function of inputs you control, so counterfactual deployments and cross-chain address parity become possible.",
                    ),
                    PostBlock::List(&[
                        "Same deployer, salt, and init code always produce the same address.",
                        "Changing a single constructor argument changes the init code hash, and with it the address.",
                        "A selfdestructed contract can be redeployed at the same address with different code.",
                    ]),
                ],
            },
            PostSection {
                id: "create3",
                title: "CREATE3",
                blocks: &[
                    PostBlock::Paragraph(
                        "CREATE3 is a pattern rather than an opcode: a CREATE2-deployed proxy immediately CREATEs the real contract. Because the proxy's nonce is always 1 at that moment, the final address depends only on the deployer and the salt, never on the contract's own bytecode.",
                    ),
                    PostBlock::Code {
                        language: "solidity",
                        code: "function deploy(bytes32 salt, bytes memory creationCode)\n    external\n    payable\n    returns (address deployed)\n{\n    deployed = CREATE3.deploy(salt, creationCode, msg.value);\n}",
                    },
                    PostBlock::Paragraph(
                        "The price is an extra contract per deployment and a fixed gas overhead. The prize is shipping different implementations to different chains while keeping one canonical address everywhere.",
                    ),
                ],
            },
        ],
    },
    Post {
        slug: "edge-rate-limiting",
        title: "Rate Limiting at the Edge",
        description: "Sliding-window counters in a serverless runtime, and why the storage round trip dominates everything else.",
        published: true,
        date: date!(2023 - 03 - 14),
        author: "Marco Ferrante",
        url: Some("https://ratelimit.dev"),
        repository: Some("https://github.com/mferrante/edge-ratelimit"),
        sections: &[
            PostSection {
                id: "the-problem",
                title: "The Problem",
                blocks: &[
                    PostBlock::Paragraph(
                        "Serverless functions keep no state between invocations, so the textbook token bucket has nowhere to live. Every request has to consult a store that outlives the function, and that store sits at least one network hop away.",
                    ),
                ],
            },
            PostSection {
                id: "sliding-windows",
                title: "Sliding Windows",
                blocks: &[
                    PostBlock::Paragraph(
                        "Fixed windows are cheap but allow a burst of twice the limit at the boundary. Interpolating between the previous and current window smooths the edge for one extra read, which the store can batch into the same pipeline.",
                    ),
                    PostBlock::Code {
                        language: "ts",
                        code: "const used =\n  current + previous * (1 - elapsedInWindow / windowSize);\nreturn used < limit;",
                    },
                ],
            },
            PostSection {
                id: "costs",
                title: "What It Costs",
                blocks: &[
                    PostBlock::Paragraph(
                        "With the counter colocated in the same region, the whole check stays under two milliseconds. Cross-region it is thirty. The algorithm never mattered; the placement did.",
                    ),
                ],
            },
        ],
    },
    Post {
        slug: "latency-budgets",
        title: "Latency Budgets for Page Renders",
        description: "Treating every server-side dependency as a spend against a fixed budget, and what gets cut first.",
        published: true,
        date: date!(2023 - 08 - 02),
        author: "Marco Ferrante",
        url: None,
        repository: None,
        sections: &[
            PostSection {
                id: "budgeting",
                title: "Budgeting",
                blocks: &[
                    PostBlock::Paragraph(
                        "A page that wants to render in 100 milliseconds cannot afford three sequential 40-millisecond reads. Writing the budget down per dependency forces the ranking conversation before the incident, not after.",
                    ),
                    PostBlock::List(&[
                        "Content lookup: 0 ms, it is compiled into the binary.",
                        "View counter read: one store round trip, capped by the client timeout.",
                        "Everything else happens after the response is already streaming.",
                    ]),
                ],
            },
            PostSection {
                id: "degrading",
                title: "Degrading on Purpose",
                blocks: &[
                    PostBlock::Paragraph(
                        "Cosmetic data earns a cosmetic failure mode. A view counter that cannot be read renders as zero; a view that cannot be recorded is dropped. Neither is worth a retry queue, and certainly not a 500.",
                    ),
                ],
            },
        ],
    },
    Post {
        slug: "zero-copy-frames",
        title: "Zero-Copy Frame Decoding",
        description: "Borrowing straight out of the receive buffer: lifetimes as a wire-format contract.",
        published: true,
        date: date!(2024 - 01 - 19),
        author: "Marco Ferrante",
        url: None,
        repository: Some("https://github.com/mferrante/framely"),
        sections: &[
            PostSection {
                id: "borrowing",
                title: "Borrowing from the Buffer",
                blocks: &[
                    PostBlock::Paragraph(
                        "A frame header is just a view over bytes that already arrived. Decoding into owned structs copies every payload twice before the application sees it; a borrowed view copies nothing and the borrow checker enforces that the buffer outlives the frame.",
                    ),
                    PostBlock::Code {
                        language: "rust",
                        code: "pub struct Frame<'buf> {\n    pub kind: FrameKind,\n    pub payload: &'buf [u8],\n}\n\npub fn decode(buf: &[u8]) -> Result<Frame<'_>, DecodeError> {\n    let (header, payload) = buf.split_at_checked(4).ok_or(DecodeError::Truncated)?;\n    Ok(Frame {\n        kind: FrameKind::try_from(header[0])?,\n        payload,\n    })\n}",
                    },
                ],
            },
            PostSection {
                id: "when-it-breaks",
                title: "When It Breaks Down",
                blocks: &[
                    PostBlock::Paragraph(
                        "The moment a frame must cross an await point, the borrow has to end. The escape hatch is a single targeted copy at the boundary, not an owned decode everywhere.",
                    ),
                ],
            },
        ],
    },
    Post {
        slug: "counting-views-honestly",
        title: "Counting Views Honestly",
        description: "Draft notes on what a page-view counter can and cannot claim.",
        published: false,
        date: date!(2024 - 05 - 30),
        author: "Marco Ferrante",
        url: None,
        repository: None,
        sections: &[
            PostSection {
                id: "draft",
                title: "Draft",
                blocks: &[
                    PostBlock::Paragraph(
                        "An unconditional increment per page load counts loads, not readers. Reloads, prefetches, and crawlers all inflate it. The number is still worth showing as long as nobody bills against it.",
                    ),
                ],
            },
        ],
    },
];
